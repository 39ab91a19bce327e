use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::adapter::Framework;
use crate::config::{HealerOptions, VisionOptions};
use crate::gateway::AiGateway;
use crate::heal::cache::HealingCache;
use crate::heal::heuristic;
use crate::heal::log::{HealSource, HealingLog, HealingRecord, HealingStats};
use crate::heal::repair::AiRepairClient;
use crate::store::JsonFileStore;
use crate::vision::VisualDiffEngine;

/// Result of a healing attempt.
///
/// The pipeline never fails outright; when every stage comes up empty the
/// outcome carries the failed locator unchanged. Compare against the input
/// to detect that case.
#[derive(Debug, Clone)]
pub struct HealOutcome {
    pub locator: String,
    pub source: HealSource,
    pub latency_ms: f64,
}

/// Orchestrates the repair pipeline: cache, AI, heuristics, vision.
///
/// Stages run in that fixed order and the first usable suggestion wins.
/// Successful repairs are written through the cache, so at most one
/// AI call is made per unique request for the cache's lifetime. Every
/// call appends exactly one record to the healing log.
pub struct LocatorHealingEngine {
    repair: AiRepairClient,
    cache: HealingCache,
    log: HealingLog,
    vision: Option<(VisualDiffEngine, VisionOptions)>,
}

impl LocatorHealingEngine {
    pub fn new(gateway: Arc<dyn AiGateway>, options: HealerOptions) -> Self {
        let cache = HealingCache::new(Box::new(JsonFileStore::open(&options.cache_path)));
        let log = HealingLog::new(&options.log_path);
        let repair = AiRepairClient::new(gateway.clone(), options.max_attempts);
        let vision = options.vision.map(|opts| {
            let engine = VisualDiffEngine::new(&opts.cache_dir).with_gateway(gateway.clone());
            (engine, opts)
        });

        Self { repair, cache, log, vision }
    }

    /// Swap the cache, e.g. for an in-memory store in tests
    pub fn with_cache(mut self, cache: HealingCache) -> Self {
        self.cache = cache;
        self
    }

    /// Run the repair pipeline for a failed locator.
    ///
    /// Never errors and never panics; stage failures are logged and the
    /// pipeline falls through. An outcome whose locator equals
    /// `failed_locator` means no stage produced a repair.
    pub fn heal(
        &mut self,
        framework: Framework,
        page_source: &str,
        failed_locator: &str,
        context_hint: &str,
    ) -> HealOutcome {
        let start = Instant::now();

        // Stage 1: cache
        if let Some(cached) = self.cache.get(framework, failed_locator, context_hint) {
            log::info!("Healing cache hit for '{}'", failed_locator);
            return self.finish(
                framework,
                failed_locator,
                context_hint,
                cached,
                HealSource::Cache,
                start,
            );
        }

        // Stage 2: AI repair
        let candidate = self
            .repair
            .repair(framework, page_source, failed_locator, context_hint);
        if is_repair(&candidate, failed_locator) {
            return self.finish(
                framework,
                failed_locator,
                context_hint,
                candidate,
                HealSource::Ai,
                start,
            );
        }

        // Stage 3: heuristic fallback
        if let Some(candidate) = heuristic::suggest(context_hint, framework) {
            if is_repair(&candidate, failed_locator) {
                log::info!(
                    "Heuristic fallback for '{}' suggested '{}'",
                    failed_locator,
                    candidate
                );
                return self.finish(
                    framework,
                    failed_locator,
                    context_hint,
                    candidate,
                    HealSource::Fallback,
                    start,
                );
            }
        }

        // Stage 4: visual fallback, when screenshots are configured
        if let Some(candidate) = self.try_vision(framework, context_hint) {
            if is_repair(&candidate, failed_locator) {
                return self.finish(
                    framework,
                    failed_locator,
                    context_hint,
                    candidate,
                    HealSource::Vision,
                    start,
                );
            }
        }

        // Every stage came up empty: identity return, recorded as a failed
        // AI heal to match the log format of unhealed attempts
        log::warn!("Healing exhausted for '{}'", failed_locator);
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.log.append(HealingRecord {
            timestamp: Utc::now(),
            framework,
            old_locator: failed_locator.to_string(),
            new_locator: failed_locator.to_string(),
            healing_source: HealSource::Ai,
            latency_ms,
            context_hint: context_hint.to_string(),
            success: false,
        });

        HealOutcome {
            locator: failed_locator.to_string(),
            source: HealSource::Ai,
            latency_ms,
        }
    }

    fn try_vision(&mut self, framework: Framework, context_hint: &str) -> Option<String> {
        let (engine, opts) = self.vision.as_mut()?;

        let anomalies = match engine.detect_anomalies(&opts.baseline, &opts.current, opts.threshold)
        {
            Ok(anomalies) => anomalies,
            Err(e) => {
                log::warn!("Visual fallback skipped: {}", e);
                return None;
            }
        };

        engine.suggest_locator(&anomalies, context_hint, framework)
    }

    fn finish(
        &mut self,
        framework: Framework,
        failed_locator: &str,
        context_hint: &str,
        healed_locator: String,
        source: HealSource,
        start: Instant,
    ) -> HealOutcome {
        if source != HealSource::Cache {
            self.cache
                .insert(framework, failed_locator, context_hint, &healed_locator);
        }

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.log.append(HealingRecord {
            timestamp: Utc::now(),
            framework,
            old_locator: failed_locator.to_string(),
            new_locator: healed_locator.clone(),
            healing_source: source,
            latency_ms,
            context_hint: context_hint.to_string(),
            success: healed_locator != failed_locator,
        });

        HealOutcome { locator: healed_locator, source, latency_ms }
    }

    /// Aggregate statistics over the healing log
    pub fn healing_stats(&self) -> HealingStats {
        self.log.stats()
    }

    /// The most recent `n` healing records
    pub fn recent_healings(&self, n: usize) -> Vec<HealingRecord> {
        self.log.recent(n)
    }

    /// Number of memoized repairs
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop all memoized repairs
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

/// A candidate counts as a repair only when non-empty and different from
/// the failed locator
fn is_repair(candidate: &str, failed_locator: &str) -> bool {
    !candidate.is_empty() && candidate != failed_locator
}
