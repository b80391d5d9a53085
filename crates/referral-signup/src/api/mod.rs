//! HTTP API for the signup service.

mod extract;
mod handlers;
mod middleware;
mod types;

pub use extract::JsonOrForm;
pub use handlers::*;
pub use middleware::logging_middleware;
pub use types::*;

use crate::config::SignupConfig;
use crate::referral::{NotificationQueue, ReferralAccountant};
use crate::registry::{Database, UserRegistry};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeFile, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Connection pool, used for health checks
    pub database: Database,
    /// User lookups and creation
    pub registry: UserRegistry,
    /// Referral crediting and notification
    pub accountant: ReferralAccountant,
    /// Signup behaviour settings
    pub signup: Arc<SignupConfig>,
}

impl AppState {
    /// Create new application state.
    pub fn new(database: Database, notifications: NotificationQueue, signup: SignupConfig) -> Self {
        let registry = UserRegistry::new(database.pool().clone(), signup.code_attempts);
        let accountant = ReferralAccountant::new(registry.clone(), notifications);

        Self {
            database,
            registry,
            accountant,
            signup: Arc::new(signup),
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let signup_page = ServeFile::new(&state.signup.static_page);

    Router::new()
        .route("/health", get(handlers::health))
        .route_service("/", signup_page.clone())
        .route(
            "/signup",
            post(handlers::signup).get_service(signup_page),
        )
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
