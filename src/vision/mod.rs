//! Screenshot comparison and vision-guided analysis.
//!
//! [`VisualDiffEngine`] does the pixel work: comparing screenshots, saving
//! amplified diff maps, detecting the changed region and reporting anomalies.
//! With a gateway attached it can also ask a vision model what changed and
//! derive a locator suggestion from the answer.

mod diff;

pub use diff::VisualDiffEngine;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a visual change, a step function of the whole-image
/// difference percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_diff_percentage(diff_percentage: f64) -> Self {
        if diff_percentage > 20.0 {
            Severity::Critical
        } else if diff_percentage > 10.0 {
            Severity::High
        } else if diff_percentage > 5.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Bounding box of changed pixels.
///
/// Width and height are corner differences (`max - min`), so a single
/// changed pixel yields a zero-sized region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub severity: Severity,
}

/// Outcome of comparing two screenshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualDiffResult {
    /// 1.0 means identical, 0.0 means every channel differs
    pub similarity: f64,

    /// Count of differing channel samples
    pub diff_pixels: u64,

    /// Differing samples as a percentage of all samples
    pub diff_percentage: f64,

    /// At most one bounding box spanning all changed pixels
    pub regions: Vec<Region>,

    /// Saved diff map, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_map_path: Option<PathBuf>,

    pub baseline_size: (u32, u32),
    pub current_size: (u32, u32),
    pub timestamp: DateTime<Utc>,
}

/// A visual change worth reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub region: Region,
    pub severity: Severity,
    pub description: String,

    /// `1 - similarity`, rounded to two decimals
    pub confidence: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_map_path: Option<PathBuf>,

    pub timestamp: DateTime<Utc>,
}

/// Parsed answer from a vision model about a screenshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionAnalysis {
    pub description: String,
    pub elements_affected: Vec<String>,
    pub suggested_action: SuggestedAction,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    UpdateLocator,
    NoActionNeeded,
    ManualReview,
}
