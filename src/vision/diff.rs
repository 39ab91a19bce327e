use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use sha2::{Digest, Sha256};

use crate::error::{HealError, Result};
use crate::gateway::AiGateway;
use crate::store::{JsonFileStore, KvStore};
use crate::vision::{Anomaly, Region, Severity, SuggestedAction, VisionAnalysis, VisualDiffResult};

/// Grayscale intensity a diff pixel must exceed to count toward the region
const REGION_PIXEL_THRESHOLD: u32 = 30;

/// Amplification factor applied to saved diff maps so small changes are
/// visible to the eye
const DIFF_AMPLIFY: u16 = 5;

/// Screenshot comparison engine with optional vision-LLM analysis.
///
/// Pixel comparison works without a gateway; `analyze_with_llm` and
/// `suggest_locator` need one attached. LLM answers are cached on disk
/// keyed by a content hash of the image path and prompt.
pub struct VisualDiffEngine {
    gateway: Option<Arc<dyn AiGateway>>,
    cache_dir: PathBuf,
    analysis_cache: JsonFileStore,
}

impl VisualDiffEngine {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        let analysis_cache = JsonFileStore::open(cache_dir.join("vision_analysis_cache.json"));
        Self { gateway: None, cache_dir, analysis_cache }
    }

    /// Builder method: attach a vision-capable gateway
    pub fn with_gateway(mut self, gateway: Arc<dyn AiGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Compare two screenshots pixel by pixel.
    ///
    /// The current image is resized to the baseline's dimensions with
    /// nearest-neighbor sampling when they differ, which trades accuracy
    /// for comparability. When `save_diff` is set, an amplified diff map
    /// with the changed region outlined is written into the cache dir.
    pub fn compare(
        &self,
        baseline_path: &Path,
        current_path: &Path,
        save_diff: bool,
    ) -> Result<VisualDiffResult> {
        let baseline = image::open(baseline_path)
            .map_err(|e| HealError::ImageCompare(format!(
                "Failed to open baseline {}: {}",
                baseline_path.display(),
                e
            )))?
            .to_rgb8();
        let mut current = image::open(current_path)
            .map_err(|e| HealError::ImageCompare(format!(
                "Failed to open current {}: {}",
                current_path.display(),
                e
            )))?
            .to_rgb8();

        let baseline_size = baseline.dimensions();
        let current_size = current.dimensions();

        if current_size != baseline_size {
            log::debug!(
                "Resizing current screenshot {:?} to baseline {:?}",
                current_size,
                baseline_size
            );
            current = image::imageops::resize(
                &current,
                baseline_size.0,
                baseline_size.1,
                FilterType::Nearest,
            );
        }

        let (width, height) = baseline_size;
        let mut diff = RgbImage::new(width, height);
        let mut diff_pixels = 0u64;

        for y in 0..height {
            for x in 0..width {
                let b = baseline.get_pixel(x, y);
                let c = current.get_pixel(x, y);
                let mut channels = [0u8; 3];
                for i in 0..3 {
                    let d = b.0[i].abs_diff(c.0[i]);
                    if d > 0 {
                        diff_pixels += 1;
                    }
                    channels[i] = d;
                }
                diff.put_pixel(x, y, Rgb(channels));
            }
        }

        let total_samples = (width as u64) * (height as u64) * 3;
        let diff_percentage = if total_samples > 0 {
            diff_pixels as f64 / total_samples as f64 * 100.0
        } else {
            0.0
        };
        let similarity = 1.0 - diff_percentage / 100.0;

        let severity = Severity::from_diff_percentage(diff_percentage);
        let regions = changed_regions(&diff, REGION_PIXEL_THRESHOLD, severity);

        let diff_map_path = if save_diff {
            Some(self.save_diff_map(&diff, &regions)?)
        } else {
            None
        };

        Ok(VisualDiffResult {
            similarity,
            diff_pixels,
            diff_percentage,
            regions,
            diff_map_path,
            baseline_size,
            current_size,
            timestamp: Utc::now(),
        })
    }

    fn save_diff_map(&self, diff: &RgbImage, regions: &[Region]) -> Result<PathBuf> {
        let mut amplified = diff.clone();
        for pixel in amplified.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as u16 * DIFF_AMPLIFY).min(255) as u8;
            }
        }

        for region in regions {
            let rect = Rect::at(region.x as i32, region.y as i32)
                .of_size(region.width.max(1), region.height.max(1));
            draw_hollow_rect_mut(&mut amplified, rect, Rgb([255, 0, 0]));
        }

        std::fs::create_dir_all(&self.cache_dir)?;
        let filename = format!("diff_{}.png", Utc::now().format("%Y%m%d_%H%M%S%3f"));
        let path = self.cache_dir.join(filename);
        amplified
            .save(&path)
            .map_err(|e| HealError::ImageCompare(format!("Failed to save diff map: {}", e)))?;

        Ok(path)
    }

    /// Compare screenshots and report anomalies when similarity falls
    /// below the threshold. Always saves a diff map so the vision stage
    /// has something to analyze.
    pub fn detect_anomalies(
        &self,
        baseline_path: &Path,
        current_path: &Path,
        threshold: f64,
    ) -> Result<Vec<Anomaly>> {
        let result = self.compare(baseline_path, current_path, true)?;

        if result.similarity >= threshold {
            return Ok(Vec::new());
        }

        let severity = Severity::from_diff_percentage(result.diff_percentage);
        let confidence = ((1.0 - result.similarity) * 100.0).round() / 100.0;

        Ok(result
            .regions
            .iter()
            .map(|region| Anomaly {
                region: *region,
                severity,
                description: format!(
                    "Visual change detected: {:.2}% of pixels differ",
                    result.diff_percentage
                ),
                confidence,
                diff_map_path: result.diff_map_path.clone(),
                timestamp: result.timestamp,
            })
            .collect())
    }

    /// Ask the vision model to describe an image.
    ///
    /// Results are cached permanently, keyed by a hash of the image path
    /// and prompt; `clear_cache` is the only eviction.
    pub fn analyze_with_llm(&mut self, image_path: &Path, prompt: &str) -> Result<VisionAnalysis> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| HealError::Config("No gateway attached for vision analysis".to_string()))?
            .clone();

        let question = if prompt.is_empty() { DEFAULT_ANALYSIS_PROMPT } else { prompt };

        let cache_key = analysis_cache_key(image_path, question);
        if let Some(cached) = self.analysis_cache.get(&cache_key) {
            if let Ok(analysis) = serde_json::from_str(cached) {
                log::debug!("Vision analysis cache hit for {}", image_path.display());
                return Ok(analysis);
            }
        }

        let response = gateway.ask_vision(&[image_path], question)?;

        let analysis = VisionAnalysis {
            description: response.trim().to_string(),
            elements_affected: extract_elements(&response),
            suggested_action: extract_action(&response),
            confidence: 0.85,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&analysis)?;
        self.analysis_cache.set(&cache_key, &json);
        if let Err(e) = self.analysis_cache.flush() {
            log::warn!("Failed to persist vision analysis cache: {}", e);
        }

        Ok(analysis)
    }

    /// Derive a locator suggestion from detected anomalies.
    ///
    /// Analyzes the first anomaly's diff map when a gateway is attached;
    /// a text-locator mention in the answer yields `text=<hint>`, otherwise
    /// a non-empty hint falls back to a role/text template for the dialect.
    pub fn suggest_locator(
        &mut self,
        anomalies: &[Anomaly],
        context_hint: &str,
        framework: crate::adapter::Framework,
    ) -> Option<String> {
        let primary = anomalies.first()?;
        let diff_map = primary.diff_map_path.as_ref()?;
        if !diff_map.exists() {
            return None;
        }

        let description = if self.gateway.is_some() {
            let prompt = format!(
                "Based on this visual diff, suggest a locator for: \"{}\"\n\n\
                 The element appears to have changed position or appearance.\n\
                 Framework: {}\n\n\
                 Suggest a robust locator strategy (CSS, XPath, or text-based) \
                 that would work with the changed element.",
                context_hint, framework
            );
            match self.analyze_with_llm(diff_map, &prompt) {
                Ok(analysis) => analysis.description,
                Err(e) => {
                    log::warn!("Vision locator analysis failed: {}", e);
                    String::new()
                }
            }
        } else {
            String::new()
        };

        if description.contains("text=") || description.contains("text:") {
            return Some(format!("text={}", context_hint));
        }

        if !context_hint.is_empty() {
            return Some(match framework {
                crate::adapter::Framework::Playwright => {
                    format!("role=button[name='{}']", context_hint)
                }
                crate::adapter::Framework::Selenium => {
                    format!("//button[contains(text(), '{}')]", context_hint)
                }
            });
        }

        None
    }

    /// Drop all cached vision analyses
    pub fn clear_cache(&mut self) {
        self.analysis_cache.clear();
        if let Err(e) = self.analysis_cache.flush() {
            log::warn!("Failed to persist vision analysis cache: {}", e);
        }
    }

    pub fn cache_len(&self) -> usize {
        self.analysis_cache.len()
    }
}

const DEFAULT_ANALYSIS_PROMPT: &str = "Analyze this screenshot and describe any UI changes or visual differences.\n\
Focus on:\n\
- Elements that moved or changed position\n\
- Elements that changed size or style\n\
- Elements that appeared or disappeared\n\
- Any other significant visual changes\n\n\
Return your analysis in a structured format.";

fn analysis_cache_key(image_path: &Path, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_path.to_string_lossy().as_bytes());
    hasher.update(b"|");
    hasher.update(prompt.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Single bounding box over all pixels whose grayscale diff exceeds the
/// threshold. Width and height are corner differences, matching the saved
/// diff map annotation.
fn changed_regions(diff: &RgbImage, threshold: u32, severity: Severity) -> Vec<Region> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, pixel) in diff.enumerate_pixels() {
        let gray = (pixel.0[0] as u32 + pixel.0[1] as u32 + pixel.0[2] as u32) / 3;
        if gray > threshold {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !found {
        return Vec::new();
    }

    vec![Region {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
        severity,
    }]
}

fn extract_elements(response: &str) -> Vec<String> {
    const KEYWORDS: &[&str] = &["button", "input", "link", "text", "image", "form", "menu", "nav"];
    let lowered = response.to_lowercase();
    KEYWORDS
        .iter()
        .filter(|k| lowered.contains(**k))
        .map(|k| k.to_string())
        .collect()
}

fn extract_action(response: &str) -> SuggestedAction {
    let lowered = response.to_lowercase();
    if lowered.contains("update locator") {
        SuggestedAction::UpdateLocator
    } else if lowered.contains("no action") || lowered.contains("no change") {
        SuggestedAction::NoActionNeeded
    } else {
        SuggestedAction::ManualReview
    }
}
