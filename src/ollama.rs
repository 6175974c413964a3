use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{error::NarrativeError, narrative::NarrativeService};

const TEMPERATURE: f32 = 0.3;
const NUM_PREDICT: u32 = 2048;

/// Narrative service backed by a local Ollama server's `/api/chat`.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    timeout: Duration,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self, NarrativeError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("repovision/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| NarrativeError::Network(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl NarrativeService for OllamaClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, NarrativeError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: TEMPERATURE,
                num_predict: NUM_PREDICT,
            },
        };

        let resp = self
            .http
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| match NarrativeError::from(e) {
                NarrativeError::Timeout { .. } => NarrativeError::Timeout {
                    seconds: self.timeout.as_secs(),
                },
                other => other,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(NarrativeError::Status { status, body });
        }

        let text = resp.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&text)?;
        Ok(parsed.message.content)
    }
}
