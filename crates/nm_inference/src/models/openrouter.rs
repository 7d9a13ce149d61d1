use std::fmt;

use async_trait::async_trait;
use nm_core::{Error, Result, SummaryRequest, Summarizer};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_prompt, clean_summary};
use crate::Config;

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

pub struct OpenRouterModel {
    client: Client,
    api_key: String,
    base_url: String,
    app_name: String,
    site_url: String,
}

impl OpenRouterModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Summarization("OpenRouter API key is required".to_string()))?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_name: config.app_name.clone(),
            site_url: config.site_url.clone(),
        })
    }

    fn chat_request(request: &SummaryRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(request),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

fn first_choice(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::Summarization(format!("malformed response: {}", e)))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::Summarization("no choices in response".to_string()))?;
    clean_summary(&content)
}

impl fmt::Debug for OpenRouterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl Summarizer for OpenRouterModel {
    fn name(&self) -> &str {
        "OpenRouter"
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        tracing::debug!(model = %request.model, "OpenRouter chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.app_name)
            .json(&Self::chat_request(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Summarization(format!(
                "OpenRouter API error ({}): {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        first_choice(&body)
    }
}
