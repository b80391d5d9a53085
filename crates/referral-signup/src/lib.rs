//! Referral Signup - phone-number signup service with referral tracking.
//!
//! Users sign up with a phone number and receive a personal referral link.
//! Signing up through someone else's link:
//! - Credits the referrer with one extra giveaway entry
//! - Records who referred whom
//! - Texts the referrer their new entry count via SlickText

pub mod api;
pub mod config;
pub mod error;
pub mod referral;
pub mod registry;

pub use config::Config;
pub use error::{NotificationError, RegistryError, SignupError};
pub use referral::{NotificationDispatcher, NotificationQueue, ReferralAccountant, SmsSender};
pub use registry::{Database, ReferralCredit, ReferralEdge, User, UserRegistry};
