use crate::core::LanguageModel;
use crate::domain::model::ModelSettings;
use crate::utils::error::{ReconError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client (Groq by default).
pub struct GroqClient {
    client: Client,
    settings: ModelSettings,
}

impl GroqClient {
    pub fn new(settings: ModelSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl LanguageModel for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        tracing::debug!("🤖 Calling {} ({})", self.settings.endpoint, self.settings.model);
        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .timeout(self.settings.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("LLM response status: {}", status);
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ReconError::LlmError {
                message: format!("HTTP {}: {}", status, text),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| ReconError::LlmError {
            message: format!("Undecodable chat completion body: {}", e),
        })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| ReconError::LlmError {
                message: "Response contained no message content".to_string(),
            })?;

        Ok(content.trim().to_string())
    }
}
