use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use std::fmt;

pub const SYSTEM_PROMPT: &str = "You are a helpful financial analyst.";
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 1024;

/// What the chat-completion endpoint answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrative {
    /// First choice's message text, verbatim
    Completion(String),
    /// Non-success status with the raw response body
    Rejected { status: u16, body: String },
}

impl Narrative {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Narrative::Rejected { .. })
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Narrative::Completion(text) => f.write_str(text),
            Narrative::Rejected { status, body } => write!(f, "❌ Error: {status} - {body}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("Could not build completion request: {0}")]
    Request(#[from] OpenAIError),
    #[error("Completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected completion response: {0}")]
    MalformedResponse(String),
}

// Extensible AI backend trait
#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    async fn narrate(&self, prompt: &str) -> Result<Narrative, NarrativeError>;
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Any OpenAI-compatible `/chat/completions` endpoint (OpenRouter by default)
pub struct ChatCompletionBackend {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatCompletionBackend {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest, OpenAIError> {
        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()
    }
}

#[async_trait]
impl NarrativeBackend for ChatCompletionBackend {
    async fn narrate(&self, prompt: &str) -> Result<Narrative, NarrativeError> {
        let request = self.build_request(prompt)?;

        info!("🤖 Requesting narrative from {} ({} prompt chars)", self.model, prompt.len());

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("❌ Completion endpoint returned {status}");
            return Ok(Narrative::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| NarrativeError::MalformedResponse(format!("{e}: {body}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| NarrativeError::MalformedResponse("No content in completion response".to_string()))?;

        info!("✅ Narrative received ({} chars)", content.len());
        Ok(Narrative::Completion(content))
    }

    fn name(&self) -> &str {
        "Chat completion"
    }
}
