//! SlickText SMS API client.

mod client;
mod error;
mod types;

pub use client::SlickTextClient;
pub use error::SlickTextError;
pub use types::*;
