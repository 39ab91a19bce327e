//! AI gateway abstraction and provider presets.
//!
//! The healing pipeline talks to LLMs exclusively through the [`AiGateway`]
//! trait, so tests substitute mock gateways and callers can plug in any
//! backend. [`HttpGateway`] is the built-in implementation for
//! OpenAI-compatible chat completion APIs.

mod http;

pub use http::HttpGateway;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Supported LLM providers, all exposing OpenAI-compatible endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
    OpenRouter,
    OpenAi,
    Ollama,
}

impl Provider {
    /// Default chat completions base URL for this provider
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Ollama => "http://localhost:11434/v1",
        }
    }

    /// Default chat model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.1-8b-instant",
            Provider::OpenRouter => "deepseek/deepseek-chat",
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Ollama => "llama3",
        }
    }

    /// Default vision-capable model for this provider
    pub fn default_vision_model(&self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.2-11b-vision-preview",
            Provider::OpenRouter => "openai/gpt-4o-mini",
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Ollama => "llava",
        }
    }

    /// Whether this provider requires an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }

    /// Stable lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::OpenRouter => "openrouter",
            Provider::OpenAi => "openai",
            Provider::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Backend seam for LLM access.
///
/// Implementations must be usable from a single thread making blocking
/// calls; errors are reported through [`crate::HealError::Gateway`].
pub trait AiGateway {
    /// Ask a text-only question and return the raw model response
    fn ask(&self, prompt: &str) -> Result<String>;

    /// Ask a question about one or more images (vision models)
    fn ask_vision(&self, images: &[&Path], question: &str) -> Result<String>;
}
