use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Sampling temperature for ranking calls. Low on purpose: the reply must
/// stick to the output grammar the response parser expects.
const RANKING_TEMPERATURE: f32 = 0.2;
const MAX_COMPLETION_TOKENS: u32 = 1500;

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ModelListResponse {
    pub data: Vec<ModelInfo>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelInfo {
    pub id: String,
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl LlmClient {
    pub fn new(base_url: Option<String>, model: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.unwrap_or_else(|| "http://localhost:1234/v1".to_string()),
            model: model.unwrap_or_else(|| "local-model".to_string()),
            api_key,
        }
    }

    pub fn set_model(&mut self, model: &str) {
        self.model = model.to_string();
    }

    pub fn set_auth(&mut self, base_url: &str, api_key: Option<String>) {
        self.base_url = base_url.to_string();
        self.api_key = api_key;
    }

    pub async fn fetch_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let mut builder = self.client.get(&url);

        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let resp = builder.send().await?;

        if !resp.status().is_success() {
            anyhow::bail!("Failed to fetch models: {}", resp.status());
        }

        let body: ModelListResponse = resp.json().await?;
        Ok(body.data.into_iter().map(|m| m.id).collect())
    }

    /// One blocking chat completion. Returns the reply text plus token
    /// usage when the server reports it.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<(String, Option<Usage>)> {
        let url = format!("{}/chat/completions", self.base_url);

        let req = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: RANKING_TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let mut builder = self.client.post(&url).json(&req);

        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let resp = builder.send().await?;

        if !resp.status().is_success() {
            let err_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Chat request failed: {}", err_text);
        }

        let body: ChatResponse = resp.json().await?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No choices in response"))?;

        Ok((content, body.usage))
    }
}
