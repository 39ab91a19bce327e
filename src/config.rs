use std::path::PathBuf;
use std::time::Duration;

use crate::gateway::Provider;

/// Configuration for the AI gateway.
///
/// API keys are passed explicitly; the library never reads the process
/// environment. A key-requiring provider without a key fails at gateway
/// construction, not at first request.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// LLM provider (determines default base URL and models)
    pub provider: Provider,

    /// API key, required for all providers except Ollama
    pub api_key: Option<String>,

    /// Chat model; defaults to the provider's standard model
    pub model: String,

    /// Vision-capable model used for screenshot questions
    pub vision_model: String,

    /// OpenAI-compatible API base URL (no trailing `/chat/completions`)
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl AiConfig {
    /// Create a configuration for the given provider with its defaults
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            api_key: None,
            model: provider.default_model().to_string(),
            vision_model: provider.default_vision_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Builder method: set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder method: override the chat model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder method: override the vision model
    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = model.into();
        self
    }

    /// Builder method: override the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder method: set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::new(Provider::Groq)
    }
}

/// Screenshot inputs for the visual fallback stage
#[derive(Debug, Clone)]
pub struct VisionOptions {
    /// Baseline (known-good) screenshot path
    pub baseline: PathBuf,

    /// Current screenshot path
    pub current: PathBuf,

    /// Similarity threshold below which anomalies are reported
    pub threshold: f64,

    /// Directory for diff maps and the vision analysis cache
    pub cache_dir: PathBuf,
}

impl VisionOptions {
    pub fn new(baseline: impl Into<PathBuf>, current: impl Into<PathBuf>) -> Self {
        Self {
            baseline: baseline.into(),
            current: current.into(),
            threshold: 0.85,
            cache_dir: PathBuf::from("logs/vision_cache"),
        }
    }

    /// Builder method: set the similarity threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Builder method: set the cache directory
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }
}

/// Options for the healing engine
#[derive(Debug, Clone)]
pub struct HealerOptions {
    /// Path of the append-only healing log (JSON array)
    pub log_path: PathBuf,

    /// Path of the persisted healing cache (JSON object)
    pub cache_path: PathBuf,

    /// Maximum AI repair attempts before falling through to heuristics
    pub max_attempts: u32,

    /// Screenshot pair for the visual fallback stage; `None` disables it
    pub vision: Option<VisionOptions>,
}

impl HealerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the healing log path
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Builder method: set the cache file path
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Builder method: set the AI retry budget
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Builder method: enable the visual fallback stage
    pub fn vision(mut self, vision: VisionOptions) -> Self {
        self.vision = Some(vision);
        self
    }
}

impl Default for HealerOptions {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("logs/healing_log.json"),
            cache_path: PathBuf::from("logs/healing_cache.json"),
            max_attempts: 3,
            vision: None,
        }
    }
}
