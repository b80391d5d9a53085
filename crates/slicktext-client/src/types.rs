//! SlickText API types.

use serde::{Deserialize, Serialize};

/// Outgoing message request.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    /// Contact lists the message is attributed to.
    pub lists: Vec<u64>,
    /// Recipient in E.164 format.
    pub number: String,
    pub body: String,
}

/// Send message response.
///
/// SlickText answers with more fields than we use; unknown ones are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
}
