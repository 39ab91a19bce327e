//! # locator-heal
//!
//! Self-healing locators for UI test automation. When a selector stops
//! matching, the repair pipeline tries memoized repairs, an LLM suggestion,
//! deterministic heuristics from the element's description, and optionally
//! screenshot-diff-guided vision analysis, before reporting a soft failure.
//!
//! ## Features
//!
//! - **Healing pipeline**: cache, AI repair with retry, heuristic fallback,
//!   visual fallback, in strict order with the first usable suggestion winning
//! - **Adaptive interaction**: tiered fill/click that degrades from native
//!   actions through DOM injection to simulated keystrokes
//! - **Smart locators**: wrap a selector once, and failing actions heal and
//!   retry transparently
//! - **Audit trail**: every healing attempt is appended to a JSON log with
//!   source, latency and outcome
//!
//! ## Healing a locator
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use locator_heal::{
//!     AiConfig, Framework, HealerOptions, HttpGateway, LocatorHealingEngine, Provider,
//! };
//!
//! # fn main() -> locator_heal::Result<()> {
//! let gateway = Arc::new(HttpGateway::new(
//!     AiConfig::new(Provider::Groq).api_key("gsk-..."),
//! )?);
//! let mut engine = LocatorHealingEngine::new(gateway, HealerOptions::default());
//!
//! let outcome = engine.heal(
//!     Framework::Playwright,
//!     "<html>...</html>",
//!     "#old-submit",
//!     "Submit button",
//! );
//! if outcome.locator != "#old-submit" {
//!     println!("healed via {:?}: {}", outcome.source, outcome.locator);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Self-healing actions against a live browser
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use headless_chrome::Browser;
//! use locator_heal::{
//!     AiConfig, CdpAdapter, Framework, HealerOptions, HttpGateway,
//!     LocatorHealingEngine, Provider, SmartLocator,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let browser = Browser::default()?;
//! let tab = browser.new_tab()?;
//! tab.navigate_to("https://example.com")?;
//!
//! let adapter = CdpAdapter::new(tab, Framework::Playwright);
//! let gateway = Arc::new(HttpGateway::new(
//!     AiConfig::new(Provider::Ollama),
//! )?);
//! let mut engine = LocatorHealingEngine::new(gateway, HealerOptions::default());
//!
//! let mut submit = SmartLocator::new("#submit", "Submit button", &adapter, &mut engine);
//! submit.click()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`heal`]: the repair pipeline (engine, cache, AI client, sanitizer, heuristics, log)
//! - [`adapter`]: framework seam and the CDP implementation
//! - [`interact`]: tiered element interaction
//! - [`vision`]: screenshot comparison and vision-LLM analysis
//! - [`gateway`]: LLM provider abstraction and HTTP client
//! - [`store`]: JSON-file persistence behind the caches
//! - [`error`]: error types and result alias

pub mod adapter;
pub mod config;
pub mod error;
pub mod gateway;
pub mod heal;
pub mod interact;
pub mod smart;
pub mod store;
pub mod vision;

pub use adapter::{CdpAdapter, Framework, FrameworkAdapter};
pub use config::{AiConfig, HealerOptions, VisionOptions};
pub use error::{HealError, Result};
pub use gateway::{AiGateway, HttpGateway, Provider};
pub use heal::{
    HealOutcome, HealSource, HealingCache, HealingLog, HealingRecord, HealingStats,
    LocatorHealingEngine,
};
pub use interact::{AdaptiveInteractor, InteractionLogEntry, InteractionMethod, InteractionStats};
pub use smart::SmartLocator;
pub use store::{JsonFileStore, KvStore, MemoryStore};
pub use vision::{Anomaly, Region, Severity, VisionAnalysis, VisualDiffEngine, VisualDiffResult};
