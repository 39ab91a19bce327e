use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::adapter::Framework;

/// How a repair was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealSource {
    Cache,
    Ai,
    Fallback,
    Vision,
}

impl std::fmt::Display for HealSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HealSource::Cache => "cache",
            HealSource::Ai => "ai",
            HealSource::Fallback => "fallback",
            HealSource::Vision => "vision",
        };
        f.write_str(name)
    }
}

/// One healing attempt, successful or not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingRecord {
    pub timestamp: DateTime<Utc>,
    pub framework: Framework,
    pub old_locator: String,
    pub new_locator: String,
    pub healing_source: HealSource,
    pub latency_ms: f64,
    pub context_hint: String,
    /// True when the pipeline produced a different locator
    pub success: bool,
}

/// Aggregate view over the healing log
#[derive(Debug, Clone, Serialize)]
pub struct HealingStats {
    pub total: usize,
    pub by_source: IndexMap<String, usize>,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub cache_hit_rate: f64,
}

/// Append-only audit log persisted as a JSON array.
///
/// Every append rewrites the file (read-modify-write). Append failures are
/// logged through the log facade and never propagate; losing an audit entry
/// must not fail a healing call.
pub struct HealingLog {
    path: PathBuf,
}

impl HealingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, record: HealingRecord) {
        if let Err(e) = self.try_append(&record) {
            log::warn!("Failed to append healing record: {}", e);
        }
    }

    fn try_append(&self, record: &HealingRecord) -> crate::Result<()> {
        let mut records = self.records();
        records.push(record.clone());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// All records; a missing or corrupt file reads as empty
    pub fn records(&self) -> Vec<HealingRecord> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(records) => records,
                Err(e) => {
                    log::warn!("Corrupt healing log {}, ignoring: {}", self.path.display(), e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        }
    }

    /// The most recent `n` records, newest last
    pub fn recent(&self, n: usize) -> Vec<HealingRecord> {
        let records = self.records();
        let skip = records.len().saturating_sub(n);
        records.into_iter().skip(skip).collect()
    }

    pub fn stats(&self) -> HealingStats {
        let records = self.records();
        let total = records.len();

        let mut by_source: IndexMap<String, usize> = IndexMap::new();
        let mut successes = 0usize;
        let mut latency_sum = 0.0;
        let mut cache_hits = 0usize;

        for record in &records {
            *by_source.entry(record.healing_source.to_string()).or_insert(0) += 1;
            if record.success {
                successes += 1;
            }
            if record.healing_source == HealSource::Cache {
                cache_hits += 1;
            }
            latency_sum += record.latency_ms;
        }

        let denom = total.max(1) as f64;
        HealingStats {
            total,
            by_source,
            success_rate: successes as f64 / denom,
            avg_latency_ms: latency_sum / denom,
            cache_hit_rate: cache_hits as f64 / denom,
        }
    }
}
