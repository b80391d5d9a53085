//! SlickText HTTP client.

use crate::error::SlickTextError;
use crate::types::*;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// SlickText messages API client.
///
/// The public key is stored using `SecretString` so it never shows up in
/// logs or debug output.
#[derive(Clone)]
pub struct SlickTextClient {
    client: Client,
    base_url: String,
    public_key: SecretString,
    list_id: u64,
}

impl SlickTextClient {
    /// Create a new SlickText client.
    ///
    /// `base_url` is the contacts endpoint of a brand list, e.g.
    /// `https://dev.slicktext.com/v1/brands/994/lists/contacts`.
    pub fn new(
        base_url: impl Into<String>,
        public_key: impl Into<String>,
        list_id: u64,
        timeout: Duration,
    ) -> Result<Self, SlickTextError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            public_key: SecretString::new(public_key.into()),
            list_id,
        })
    }

    /// Get the configured list id.
    pub fn list_id(&self) -> u64 {
        self.list_id
    }

    /// Send a text message to a single number.
    #[instrument(skip(self, body))]
    pub async fn send_message(
        &self,
        number: &str,
        body: &str,
    ) -> Result<SendMessageResponse, SlickTextError> {
        let request = SendMessageRequest {
            lists: vec![self.list_id],
            number: number.to_string(),
            body: body.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .basic_auth(self.public_key.expose_secret(), None::<&str>)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("SlickText rejected credentials");
            return Err(SlickTextError::Unauthorized);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %message, "Send failed");
            return Err(SlickTextError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.unwrap_or_default();
        let parsed = if text.trim().is_empty() {
            SendMessageResponse::default()
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                debug!("Unrecognized send response ({}): {}", e, text);
                SendMessageResponse::default()
            })
        };

        debug!("Sent message to {}", number);
        Ok(parsed)
    }
}
