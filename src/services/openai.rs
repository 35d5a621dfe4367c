use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use crate::models::AdvisoryRequest;
use crate::services::advisor::{AdvisorError, AdvisoryService};

/// Chat-completions client for the advisory model
///
/// One request per survey, no retries: a failure is reported straight back
/// to the caller, who still has the deterministic baseline.
pub struct OpenAiAdvisor {
    endpoint: String,
    model: String,
    temperature: f64,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiAdvisor {
    /// Create a new advisor client
    ///
    /// A missing `api_key` is allowed here; it is reported per request.
    pub fn new(
        endpoint: String,
        model: String,
        temperature: f64,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AdvisorError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            model,
            temperature,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn chat_body(&self, request: &AdvisoryRequest) -> Result<Value, AdvisorError> {
        let data = serde_json::to_string(&request.payload)?;

        Ok(json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": request.instructions },
                { "role": "user", "content": data },
            ],
        }))
    }
}

#[async_trait]
impl AdvisoryService for OpenAiAdvisor {
    fn ensure_configured(&self) -> Result<(), AdvisorError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(AdvisorError::MissingCredential),
        }
    }

    async fn advise(&self, request: &AdvisoryRequest) -> Result<String, AdvisorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AdvisorError::MissingCredential)?;
        let body = self.chat_body(request)?;

        tracing::debug!("Calling advisor model {} at {}", self.model, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("Advisor returned {}: {}", status, text);
            return Err(AdvisorError::ApiError {
                status: status.as_u16(),
                body: text,
            });
        }

        // A malformed envelope is treated like an empty answer
        let envelope: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Advisor response is not JSON: {}", e);
                return Ok(String::new());
            }
        };

        let content = envelope
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }
}
