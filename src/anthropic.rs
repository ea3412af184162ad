//! Text completion through the Anthropic Messages API.

use std::time::Duration;

use agenda_core::advisor::Completion;
use agenda_core::config::AdvisorConfig;
use agenda_core::error::{AgendaError, AgendaResult};
use serde::{Deserialize, Serialize};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Anthropic {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl Anthropic {
    /// Build a client, or `None` when no API key is configured.
    pub fn from_config(config: &AdvisorConfig) -> AgendaResult<Option<Self>> {
        let Some(api_key) = config.api_key.clone().filter(|k| !k.is_empty()) else {
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AgendaError::Advisor(e.to_string()))?;

        Ok(Some(Anthropic {
            http,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }))
    }
}

impl Completion for Anthropic {
    async fn complete(&self, prompt: &str) -> AgendaResult<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgendaError::Advisor(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "advisor request rejected");
            return Err(AgendaError::Advisor(format!("{status}: {body}")));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AgendaError::AdvisorMalformedOutput(e.to_string()))?;

        first_text(body).ok_or_else(|| AgendaError::AdvisorMalformedOutput("response has no text content".to_string()))
    }
}

fn first_text(response: MessagesResponse) -> Option<String> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .map(|block| block.text)
}
