use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::{HealError, Result};
use crate::gateway::AiGateway;

/// Blocking HTTP client for OpenAI-compatible chat completion APIs.
///
/// Works against Groq, OpenRouter, OpenAI and Ollama with provider presets
/// from [`crate::gateway::Provider`]. Vision questions embed images as
/// base64 data URLs.
pub struct HttpGateway {
    client: reqwest::blocking::Client,
    config: AiConfig,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway from the given configuration.
    ///
    /// Fails when the provider requires an API key and none is set. This is
    /// the only hard error in the healing stack; everything downstream
    /// degrades instead of failing.
    pub fn new(config: AiConfig) -> Result<Self> {
        if config.provider.requires_api_key() && config.api_key.is_none() {
            return Err(HealError::Config(format!(
                "Provider '{}' requires an API key",
                config.provider
            )));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HealError::Gateway(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self { client, config, base_url })
    }

    fn post_chat(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .map_err(|e| HealError::Gateway(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(HealError::Gateway(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| HealError::Gateway(format!("Failed to parse response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content_text())
            .ok_or_else(|| HealError::Gateway("Response contained no choices".to_string()))
    }

    fn encode_image(path: &Path) -> Result<String> {
        let bytes = fs::read(path)?;
        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => "image/png",
        };
        Ok(format!("data:{};base64,{}", mime, BASE64.encode(bytes)))
    }
}

impl AiGateway for HttpGateway {
    fn ask(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: ChatContent::Text(prompt.to_string()),
            }],
            temperature: 0.1,
            max_tokens: 500,
        };

        self.post_chat(&request)
    }

    fn ask_vision(&self, images: &[&Path], question: &str) -> Result<String> {
        let mut parts = vec![ContentPart::Text { text: question.to_string() }];
        for image in images {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl { url: Self::encode_image(image)? },
            });
        }

        let request = ChatRequest {
            model: self.config.vision_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: ChatContent::Parts(parts),
            }],
            temperature: 0.1,
            max_tokens: 500,
        };

        self.post_chat(&request)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

/// Message content: plain text for chat, typed parts for vision
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize, Deserialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatMessage {
    fn content_text(self) -> String {
        match self.content {
            ChatContent::Text(text) => text,
            ChatContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}
