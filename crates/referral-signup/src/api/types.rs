//! API request and response types.

use serde::{Deserialize, Serialize};

/// Signup submission, sent as JSON or as an HTML form.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    /// Raw phone number as typed by the user
    #[serde(default)]
    pub phone_number: Option<String>,

    /// Referral code from the link the user followed
    #[serde(default, rename = "ref")]
    pub referral_code: Option<String>,
}

/// Response after a successful signup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub referral_link: String,
    /// The new user's own entries, always 1
    pub entries: i64,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub users: i64,
    pub database_healthy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_response_field_names() {
        let response = SignupResponse {
            message: "Signed up successfully!".into(),
            referral_link: "https://example.com/signup?ref=abc".into(),
            entries: 1,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["referralLink"], "https://example.com/signup?ref=abc");
        assert_eq!(json["entries"], 1);
        assert!(json.get("referral_link").is_none());
    }

    #[test]
    fn test_signup_request_ref_field() {
        let request: SignupRequest =
            serde_json::from_str(r#"{"phone_number": "5551234567", "ref": "abc"}"#).unwrap();
        assert_eq!(request.phone_number.as_deref(), Some("5551234567"));
        assert_eq!(request.referral_code.as_deref(), Some("abc"));

        let request: SignupRequest = serde_json::from_str("{}").unwrap();
        assert!(request.phone_number.is_none());
        assert!(request.referral_code.is_none());
    }
}
