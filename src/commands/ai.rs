// Completion providers: Anthropic Messages (SSE streaming) and OpenAI-compatible chat.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// System instruction plus the user turn sent to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Everything a provider needs, passed in explicitly at construction.
#[derive(Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Text generation: prompt in, answer text out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError>;
}

fn http_client(settings: &CompletionSettings) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(ProviderError::from)
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body: body.chars().take(512).collect(),
    })
}

// ── Anthropic ─────────────────────────────────────────────────────────────────

/// Anthropic Messages API over server-sent events.
pub struct AnthropicProvider {
    client: reqwest::Client,
    settings: CompletionSettings,
}

impl AnthropicProvider {
    pub fn new(settings: CompletionSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(&settings)?,
            settings,
        })
    }
}

/// Outcome of one `data:` line of the event stream.
#[derive(Debug, PartialEq)]
enum StreamEvent {
    Text(String),
    Done,
    Error(String),
    Ignored,
}

fn parse_stream_line(line: &str) -> StreamEvent {
    let Some(data) = line.strip_prefix("data:") else {
        return StreamEvent::Ignored;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return StreamEvent::Done;
    }
    let Ok(json) = serde_json::from_str::<Value>(data) else {
        return StreamEvent::Ignored;
    };
    match json["type"].as_str() {
        Some("message_stop") => StreamEvent::Done,
        Some("error") => StreamEvent::Error(
            json["error"]["message"]
                .as_str()
                .unwrap_or("unknown stream error")
                .to_string(),
        ),
        _ => match json["delta"]["text"].as_str() {
            Some(delta) => StreamEvent::Text(delta.to_string()),
            None => StreamEvent::Ignored,
        },
    }
}

/// Accumulates streamed text. Network chunks may split a line, or a
/// multi-byte character, so bytes are only decoded once a line is complete.
#[derive(Default)]
struct StreamBuffer {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

impl StreamBuffer {
    fn push(&mut self, chunk: impl AsRef<[u8]>) -> Result<(), ProviderError> {
        self.pending.extend_from_slice(chunk.as_ref());
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let line = decode_line(&line)?;
            self.line(line.trim_end_matches(['\r', '\n']))?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<String, ProviderError> {
        let rest = std::mem::take(&mut self.pending);
        if !rest.is_empty() {
            let rest = decode_line(&rest)?;
            self.line(rest.trim_end())?;
        }
        Ok(self.text)
    }

    fn line(&mut self, line: &str) -> Result<(), ProviderError> {
        if self.done {
            return Ok(());
        }
        match parse_stream_line(line) {
            StreamEvent::Text(delta) => self.text.push_str(&delta),
            StreamEvent::Done => self.done = true,
            StreamEvent::Error(message) => return Err(ProviderError::Malformed(message)),
            StreamEvent::Ignored => {}
        }
        Ok(())
    }
}

fn decode_line(line: &[u8]) -> Result<&str, ProviderError> {
    std::str::from_utf8(line)
        .map_err(|e| ProviderError::Malformed(format!("event stream is not UTF-8: {e}")))
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
            "stream": true,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ]
        });

        let url = format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;
        let mut response = ensure_success(response).await?;

        let mut buffer = StreamBuffer::default();
        while let Some(chunk) = response.chunk().await.map_err(ProviderError::from_reqwest)? {
            buffer.push(&chunk)?;
            if buffer.done {
                break;
            }
        }

        buffer.finish()
    }
}

// ── OpenAI-compatible ─────────────────────────────────────────────────────────

/// `POST /v1/chat/completions` on OpenAI or any compatible server.
pub struct OpenAiProvider {
    client: reqwest::Client,
    settings: CompletionSettings,
}

impl OpenAiProvider {
    pub fn new(settings: CompletionSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(&settings)?,
            settings,
        })
    }
}

fn chat_completion_text(response: &Value) -> Result<String, ProviderError> {
    response
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Malformed("missing choices[0].message.content".to_string()))
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user},
            ],
        });

        let url = format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;
        let response = ensure_success(response).await?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        chat_completion_text(&json)
    }
}
