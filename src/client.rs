use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;

use crate::config::Config;
use crate::error::SessionError;
use crate::source::{ResponseSource, ResponseStream, StreamSource};

/// Longest error body kept for a non-success status.
const ERROR_BODY_LIMIT: usize = 512;

/// A chat-completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub n: u32,
    pub stream: bool,
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatRequest {
    /// Single-turn request for `prompt` using the configured options.
    pub fn for_prompt(config: &Config, prompt: &str) -> Self {
        let request = &config.request;
        Self {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: request.temperature,
            top_p: request.top_p,
            n: request.n,
            stream: request.stream,
            max_tokens: config.max_tokens(),
            presence_penalty: request.presence_penalty,
            frequency_penalty: request.frequency_penalty,
        }
    }
}

/// Opens streaming chat-completions responses.
pub struct ChatClient {
    client: Client,
    url: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(config: &Config) -> Result<Self, SessionError> {
        let api_key = config
            .request
            .resolve_api_key()
            .ok_or(SessionError::MissingApiKey)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.request.connect_timeout_seconds))
            .build()
            .map_err(|source| SessionError::Connect { source })?;

        Ok(Self {
            client,
            url: config.request.url.clone(),
            api_key,
        })
    }

    /// POST `request` and return its body as a byte source.
    pub async fn open(&self, request: &ChatRequest) -> Result<ResponseSource, SessionError> {
        tracing::info!(url = %self.url, model = %request.model, "opening stream");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|source| SessionError::Connect { source })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, ERROR_BODY_LIMIT);
            return Err(SessionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ResponseStream = Box::pin(response.bytes_stream());
        Ok(StreamSource::new(body))
    }
}

fn truncate_at_char_boundary(text: &mut String, limit: usize) {
    if text.len() <= limit {
        return;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_options() {
        let config = Config::default();
        let request = ChatRequest::for_prompt(&config, "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "glm-4-flash");
        assert_eq!(json["stream"], true);
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["n"], 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn explicit_max_tokens_wins() {
        let mut config = Config::default();
        config.request.max_tokens = Some(256);
        assert_eq!(ChatRequest::for_prompt(&config, "q").max_tokens, 256);
    }

    #[test]
    fn missing_key_is_reported() {
        let mut config = Config::default();
        config.request.api_key = Some(String::new());
        if std::env::var(crate::config::API_KEY_ENV).is_err() {
            assert!(matches!(
                ChatClient::new(&config),
                Err(SessionError::MissingApiKey)
            ));
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut text = "日本語".to_string();
        truncate_at_char_boundary(&mut text, 4);
        assert_eq!(text, "日");
    }
}
