//! HTTP request handlers.

use super::extract::JsonOrForm;
use super::types::{HealthResponse, SignupRequest, SignupResponse};
use super::AppState;
use crate::error::SignupError;
use crate::registry::{normalize_phone_number, referral_link, validate_national_number};
use axum::{extract::State, Json};
use tracing::{info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_healthy = state.database.health_check().await.is_ok();
    let users = match state.registry.count().await {
        Ok(users) => users,
        Err(e) => {
            warn!(error = %e, "Failed to count users");
            0
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        users,
        database_healthy,
    })
}

/// Sign up a phone number, optionally crediting a referrer.
pub async fn signup(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<SignupRequest>,
) -> Result<Json<SignupResponse>, SignupError> {
    let raw = request.phone_number.as_deref().unwrap_or_default();
    let phone_number = normalize_phone_number(raw).map_err(|_| SignupError::PhoneNumberRequired)?;

    if state.signup.strict_phone_validation {
        validate_national_number(&phone_number).map_err(SignupError::InvalidPhoneNumber)?;
    }

    info!(phone_number = %phone_number, "Signup request received");

    // Concurrent signups of one number can both pass this check; the unique
    // index settles them in `register`.
    let existing = state
        .registry
        .find_by_phone(&phone_number)
        .await
        .map_err(SignupError::Database)?;
    if existing.is_some() {
        warn!(phone_number = %phone_number, "Phone number already signed up");
        return Err(SignupError::AlreadySignedUp);
    }

    let user = state.registry.register(&phone_number).await.map_err(|e| {
        let err = SignupError::from_registration(e);
        if matches!(err, SignupError::AlreadySignedUp) {
            warn!(phone_number = %phone_number, "Lost signup race for phone number");
        }
        err
    })?;

    if let Some(code) = request.referral_code.as_deref().filter(|c| !c.is_empty()) {
        state.accountant.apply(code, &user).await;
    }

    info!(phone_number = %phone_number, user_id = user.id, "Signed up");

    Ok(Json(SignupResponse {
        message: "Signed up successfully!".to_string(),
        referral_link: referral_link(&state.signup.referral_base_url, &user.referral_code),
        entries: 1,
    }))
}
