use std::env;

use anyhow::anyhow;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

use crate::store::{RelayClient, RelayError};
use crate::web::models::Message;

const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3001/api/chat";

/// `RelayClient` over HTTP, the counterpart of the relay's `/api/chat`.
pub struct HttpRelay {
    url: String,
    client: Client,
}

impl HttpRelay {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    pub fn from_env() -> Self {
        let url = env::var("CHAT_RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string());
        Self::new(url)
    }
}

#[async_trait]
impl RelayClient for HttpRelay {
    async fn send(&self, message: &str, history: &[Message]) -> Result<String, RelayError> {
        let payload = json!({ "message": message, "history": history });
        debug!("POST {}: {} prior turns", self.url, history.len());

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RelayError::Connection(e.into()))?;

        // The relay reports failures in the body; read it for any status.
        let body: Value = response
            .json()
            .await
            .map_err(|e| RelayError::Connection(e.into()))?;

        if body.get("success").and_then(Value::as_bool) == Some(true) {
            body.get("response")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| RelayError::Connection(anyhow!("relay response carried no text")))
        } else {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("the chat server reported an unknown error")
                .to_string();
            Err(RelayError::Relay(message))
        }
    }
}
