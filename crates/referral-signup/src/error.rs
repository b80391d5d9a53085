//! Error types for the signup service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use slicktext_client::SlickTextError;
use thiserror::Error;
use tracing::error;

/// Which uniqueness constraint a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    PhoneNumber,
    ReferralCode,
}

/// User registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unique constraint violated: {0:?}")]
    Conflict(ConflictKind),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RegistryError {
    /// Classify an sqlx error, turning unique violations into conflicts.
    pub(crate) fn classify(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                // SQLite reports "UNIQUE constraint failed: users.<column>"
                let kind = if db.message().contains("referral_code") {
                    ConflictKind::ReferralCode
                } else {
                    ConflictKind::PhoneNumber
                };
                return RegistryError::Conflict(kind);
            }
        }
        RegistryError::Storage(e)
    }
}

/// Errors surfaced by `POST /signup`.
#[derive(Debug, Error)]
pub enum SignupError {
    #[error("Phone number required")]
    PhoneNumberRequired,

    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Phone number already signed up")]
    AlreadySignedUp,

    #[error("Database error: {0}")]
    Database(RegistryError),

    #[error("Error signing up: {0}")]
    SignupFailed(RegistryError),
}

impl SignupError {
    /// Map a failed registration insert onto the response it produces.
    ///
    /// A phone-number conflict means a concurrent signup won the race. Running
    /// out of referral codes is reported as a server failure (500), not a
    /// client conflict: the caller did nothing wrong and may simply retry.
    pub fn from_registration(e: RegistryError) -> Self {
        match e {
            RegistryError::Conflict(ConflictKind::PhoneNumber) => SignupError::AlreadySignedUp,
            other => SignupError::SignupFailed(other),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SignupError::PhoneNumberRequired => (StatusCode::BAD_REQUEST, "Phone number required"),
            SignupError::InvalidPhoneNumber(_) => (StatusCode::BAD_REQUEST, "Invalid phone number"),
            SignupError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "Invalid request body"),
            SignupError::AlreadySignedUp => {
                (StatusCode::BAD_REQUEST, "Phone number already signed up")
            }
            SignupError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            SignupError::SignupFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error signing up")
            }
        };

        if status.is_server_error() {
            error!("Signup failed: {}", self);
        }

        let body = ErrorResponse {
            message: message.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Outbound notification failure. Logged, never returned to callers.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("SlickText error: {0}")]
    SlickText(#[from] SlickTextError),

    #[error("Notifications disabled")]
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: SignupError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_render_message() {
        let (status, json) = render(SignupError::PhoneNumberRequired).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, serde_json::json!({ "message": "Phone number required" }));

        let (status, json) = render(SignupError::AlreadySignedUp).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Phone number already signed up");
    }

    #[tokio::test]
    async fn test_storage_errors_hide_details() {
        let err = SignupError::Database(RegistryError::Storage(sqlx::Error::PoolTimedOut));
        let (status, json) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({ "message": "Database error" }));

        let err = SignupError::SignupFailed(RegistryError::Storage(sqlx::Error::PoolClosed));
        let (status, json) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({ "message": "Error signing up" }));
    }

    #[tokio::test]
    async fn test_registration_phone_conflict_is_already_signed_up() {
        let err = SignupError::from_registration(RegistryError::Conflict(ConflictKind::PhoneNumber));
        assert!(matches!(err, SignupError::AlreadySignedUp));

        let (status, json) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Phone number already signed up");
    }

    #[tokio::test]
    async fn test_registration_code_exhaustion_is_server_error() {
        let err =
            SignupError::from_registration(RegistryError::Conflict(ConflictKind::ReferralCode));
        assert!(matches!(
            err,
            SignupError::SignupFailed(RegistryError::Conflict(ConflictKind::ReferralCode))
        ));

        let (status, json) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Error signing up");
    }

    #[tokio::test]
    async fn test_registration_storage_failure_is_server_error() {
        let err = SignupError::from_registration(RegistryError::Storage(sqlx::Error::PoolClosed));
        let (status, json) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({ "message": "Error signing up" }));
    }

    #[tokio::test]
    async fn test_registry_conflicts_map_through_to_responses() {
        let db = crate::registry::Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let registry = crate::registry::UserRegistry::new(db.pool().clone(), 2);
        registry.create("+15551234567", "taken1234").await.unwrap();

        // Same number inserted behind the duplicate pre-check
        let err = registry.register("+15551234567").await.unwrap_err();
        let (status, json) = render(SignupError::from_registration(err)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Phone number already signed up");

        // Every generated code collides
        let err = registry
            .register_with("+15559876543", || "taken1234".to_string())
            .await
            .unwrap_err();
        let (status, json) = render(SignupError::from_registration(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Error signing up");
    }

    #[test]
    fn test_non_database_errors_stay_storage() {
        let err = RegistryError::classify(sqlx::Error::RowNotFound);
        assert!(matches!(err, RegistryError::Storage(_)));
    }
}
