//! The locator repair pipeline.
//!
//! [`LocatorHealingEngine`] runs the stages in fixed order: memoized
//! repairs, AI suggestions with retry, deterministic heuristics from the
//! context hint, and optionally screenshot-diff-guided vision analysis.
//! The submodules are usable on their own: [`sanitize`] normalizes model
//! output and [`heuristic`] maps hints to locator templates without any
//! AI involvement.

pub mod cache;
pub mod engine;
pub mod heuristic;
pub mod log;
pub mod repair;
pub mod sanitize;

pub use cache::HealingCache;
pub use engine::{HealOutcome, LocatorHealingEngine};
pub use log::{HealSource, HealingLog, HealingRecord, HealingStats};
pub use repair::AiRepairClient;
