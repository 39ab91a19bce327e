//! Adaptive element interaction with tiered fallbacks.
//!
//! Each operation tries progressively more invasive strategies until one
//! succeeds: the framework's native action, then DOM injection, then
//! simulated keystrokes, and finally a degraded `false` return. No retries
//! within a tier; the first success wins and is logged.

use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::adapter::FrameworkAdapter;

/// Which tier carried out an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMethod {
    Direct,
    JsInject,
    HumanTyping,
    Degraded,
}

impl std::fmt::Display for InteractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InteractionMethod::Direct => "direct",
            InteractionMethod::JsInject => "js_inject",
            InteractionMethod::HumanTyping => "human_typing",
            InteractionMethod::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

/// One completed interaction, successful or degraded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionLogEntry {
    pub method: InteractionMethod,
    pub latency_ms: f64,
    pub selector: String,
    pub context: String,
    pub timestamp: DateTime<Utc>,
    pub failed: bool,
}

/// Per-method interaction counts
#[derive(Debug, Clone, Serialize)]
pub struct InteractionStats {
    pub total: usize,
    pub by_method: IndexMap<String, usize>,
    pub failed: usize,
}

/// Tiered fill/click/navigate over a framework adapter.
///
/// Returns booleans instead of errors: callers treat `false` as a degraded
/// interaction, never as an exception. The per-call log is in-memory and
/// cleared explicitly.
pub struct AdaptiveInteractor<'a> {
    adapter: &'a dyn FrameworkAdapter,
    log: Vec<InteractionLogEntry>,
}

impl<'a> AdaptiveInteractor<'a> {
    pub fn new(adapter: &'a dyn FrameworkAdapter) -> Self {
        Self { adapter, log: Vec::new() }
    }

    /// Put `value` into the element behind `selector`.
    ///
    /// Tiers: native fill, JS value injection with input/change/blur
    /// events, focus plus per-character typing with randomized human-like
    /// delays, degraded.
    pub fn safe_fill(&mut self, selector: &str, value: &str, context: &str) -> bool {
        let start = Instant::now();

        if self.adapter.fill(selector, value).is_ok() {
            self.record(InteractionMethod::Direct, start, selector, context, false);
            return true;
        }
        log::debug!("Direct fill of '{}' failed, trying JS injection", selector);

        if self.run_js(&fill_script(selector, value)) {
            self.record(InteractionMethod::JsInject, start, selector, context, false);
            return true;
        }
        log::debug!("JS fill of '{}' failed, trying human typing", selector);

        if self.human_type(selector, value) {
            self.record(InteractionMethod::HumanTyping, start, selector, context, false);
            return true;
        }

        log::warn!("All fill tiers failed for '{}'", selector);
        self.record(InteractionMethod::Degraded, start, selector, context, true);
        false
    }

    /// Click the element behind `selector`.
    ///
    /// Tiers: native click, JS `el.click()`, focus plus Enter (logged as
    /// human typing), raw MouseEvent dispatch (logged as JS injection),
    /// degraded.
    pub fn safe_click(&mut self, selector: &str, context: &str) -> bool {
        let start = Instant::now();

        if self.adapter.click(selector).is_ok() {
            self.record(InteractionMethod::Direct, start, selector, context, false);
            return true;
        }
        log::debug!("Direct click on '{}' failed, trying JS click", selector);

        if self.run_js(&click_script(selector)) {
            self.record(InteractionMethod::JsInject, start, selector, context, false);
            return true;
        }
        log::debug!("JS click on '{}' failed, trying keyboard activation", selector);

        if self.adapter.focus(selector).is_ok() && self.adapter.press_key("Enter").is_ok() {
            self.record(InteractionMethod::HumanTyping, start, selector, context, false);
            return true;
        }
        log::debug!("Keyboard activation of '{}' failed, dispatching MouseEvent", selector);

        if self.run_js(&mouse_event_script(selector)) {
            self.record(InteractionMethod::JsInject, start, selector, context, false);
            return true;
        }

        log::warn!("All click tiers failed for '{}'", selector);
        self.record(InteractionMethod::Degraded, start, selector, context, true);
        false
    }

    /// Navigate to a URL, degraded `false` on failure
    pub fn safe_navigate(&mut self, url: &str) -> bool {
        let start = Instant::now();

        if self.adapter.navigate(url).is_ok() {
            self.record(InteractionMethod::Direct, start, url, "navigate", false);
            return true;
        }

        log::warn!("Navigation to '{}' failed", url);
        self.record(InteractionMethod::Degraded, start, url, "navigate", true);
        false
    }

    fn run_js(&self, script: &str) -> bool {
        self.adapter.evaluate_bool(script).unwrap_or(false)
    }

    fn human_type(&self, selector: &str, value: &str) -> bool {
        if self.adapter.focus(selector).is_err() {
            return false;
        }

        // Best-effort clear before typing
        self.adapter.press_key("End").ok();
        for _ in 0..value.len() + 20 {
            if self.adapter.press_key("Backspace").is_err() {
                break;
            }
        }

        let mut rng = rand::thread_rng();
        let mut buf = [0u8; 4];
        for ch in value.chars() {
            if self.adapter.type_text(selector, ch.encode_utf8(&mut buf)).is_err() {
                return false;
            }
            thread::sleep(Duration::from_millis(rng.gen_range(45..=80)));
        }

        true
    }

    fn record(
        &mut self,
        method: InteractionMethod,
        start: Instant,
        selector: &str,
        context: &str,
        failed: bool,
    ) {
        self.log.push(InteractionLogEntry {
            method,
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            selector: selector.to_string(),
            context: context.to_string(),
            timestamp: Utc::now(),
            failed,
        });
    }

    /// All interactions recorded since construction or the last clear
    pub fn interaction_log(&self) -> &[InteractionLogEntry] {
        &self.log
    }

    pub fn stats(&self) -> InteractionStats {
        let mut by_method: IndexMap<String, usize> = IndexMap::new();
        let mut failed = 0usize;
        for entry in &self.log {
            *by_method.entry(entry.method.to_string()).or_insert(0) += 1;
            if entry.failed {
                failed += 1;
            }
        }
        InteractionStats { total: self.log.len(), by_method, failed }
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

fn fill_script(selector: &str, value: &str) -> String {
    format!(
        "(function() {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.focus();
            el.value = {val};
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            el.dispatchEvent(new Event('blur', {{ bubbles: true }}));
            return true;
        }})()",
        sel = serde_json::Value::String(selector.to_string()),
        val = serde_json::Value::String(value.to_string()),
    )
}

fn click_script(selector: &str) -> String {
    format!(
        "(function() {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.click();
            return true;
        }})()",
        sel = serde_json::Value::String(selector.to_string()),
    )
}

fn mouse_event_script(selector: &str) -> String {
    format!(
        "(function() {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.dispatchEvent(new MouseEvent('click', {{
                view: window,
                bubbles: true,
                cancelable: true
            }}));
            return true;
        }})()",
        sel = serde_json::Value::String(selector.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Framework;
    use crate::error::{HealError, Result};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Adapter whose operations succeed or fail according to a script
    struct ScriptedAdapter {
        fill_ok: bool,
        click_ok: bool,
        focus_ok: bool,
        js_results: RefCell<VecDeque<bool>>,
        type_calls: RefCell<Vec<String>>,
    }

    impl ScriptedAdapter {
        fn new() -> Self {
            Self {
                fill_ok: false,
                click_ok: false,
                focus_ok: false,
                js_results: RefCell::new(VecDeque::new()),
                type_calls: RefCell::new(Vec::new()),
            }
        }

        fn js(self, results: &[bool]) -> Self {
            *self.js_results.borrow_mut() = results.iter().copied().collect();
            self
        }
    }

    impl FrameworkAdapter for ScriptedAdapter {
        fn framework(&self) -> Framework {
            Framework::Playwright
        }
        fn page_source(&self) -> Result<String> {
            Ok(String::new())
        }
        fn find_element(&self, _locator: &str) -> Result<()> {
            Ok(())
        }
        fn click(&self, locator: &str) -> Result<()> {
            if self.click_ok {
                Ok(())
            } else {
                Err(HealError::ElementNotFound {
                    locator: locator.to_string(),
                    reason: "scripted failure".to_string(),
                })
            }
        }
        fn fill(&self, locator: &str, _value: &str) -> Result<()> {
            if self.fill_ok {
                Ok(())
            } else {
                Err(HealError::ElementNotFound {
                    locator: locator.to_string(),
                    reason: "scripted failure".to_string(),
                })
            }
        }
        fn get_text(&self, _locator: &str) -> Result<String> {
            Ok(String::new())
        }
        fn is_visible(&self, _locator: &str) -> Result<bool> {
            Ok(true)
        }
        fn evaluate_bool(&self, _script: &str) -> Result<bool> {
            self.js_results
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| HealError::Browser("no scripted result".to_string()))
        }
        fn focus(&self, _locator: &str) -> Result<()> {
            if self.focus_ok {
                Ok(())
            } else {
                Err(HealError::Browser("no focus".to_string()))
            }
        }
        fn press_key(&self, _key: &str) -> Result<()> {
            if self.focus_ok {
                Ok(())
            } else {
                Err(HealError::Browser("no keys".to_string()))
            }
        }
        fn type_text(&self, _locator: &str, text: &str) -> Result<()> {
            if self.focus_ok {
                self.type_calls.borrow_mut().push(text.to_string());
                Ok(())
            } else {
                Err(HealError::Browser("no typing".to_string()))
            }
        }
    }

    #[test]
    fn test_fill_direct_success() {
        let adapter = ScriptedAdapter { fill_ok: true, ..ScriptedAdapter::new() };
        let mut interactor = AdaptiveInteractor::new(&adapter);

        assert!(interactor.safe_fill("#name", "Alice", "name field"));
        let log = interactor.interaction_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].method, InteractionMethod::Direct);
        assert!(!log[0].failed);
    }

    #[test]
    fn test_fill_falls_through_to_js() {
        let adapter = ScriptedAdapter::new().js(&[true]);
        let mut interactor = AdaptiveInteractor::new(&adapter);

        assert!(interactor.safe_fill("#name", "Alice", ""));
        let log = interactor.interaction_log();
        assert_eq!(log.len(), 1, "only the winning tier is logged");
        assert_eq!(log[0].method, InteractionMethod::JsInject);
    }

    #[test]
    fn test_fill_human_typing_tier() {
        let adapter = ScriptedAdapter { focus_ok: true, ..ScriptedAdapter::new() }.js(&[false]);
        let mut interactor = AdaptiveInteractor::new(&adapter);

        assert!(interactor.safe_fill("#name", "ab", ""));
        assert_eq!(interactor.interaction_log()[0].method, InteractionMethod::HumanTyping);
        assert_eq!(*adapter.type_calls.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_fill_degraded_returns_false() {
        let adapter = ScriptedAdapter::new();
        let mut interactor = AdaptiveInteractor::new(&adapter);

        assert!(!interactor.safe_fill("#name", "Alice", "ctx"));
        let log = interactor.interaction_log();
        assert_eq!(log[0].method, InteractionMethod::Degraded);
        assert!(log[0].failed);
    }

    #[test]
    fn test_click_direct_success() {
        let adapter = ScriptedAdapter { click_ok: true, ..ScriptedAdapter::new() };
        let mut interactor = AdaptiveInteractor::new(&adapter);

        assert!(interactor.safe_click("#go", ""));
        assert_eq!(interactor.interaction_log()[0].method, InteractionMethod::Direct);
    }

    #[test]
    fn test_click_keyboard_tier_logged_as_human_typing() {
        // Direct click fails, JS click returns false, focus+Enter works
        let adapter = ScriptedAdapter { focus_ok: true, ..ScriptedAdapter::new() }.js(&[false]);
        let mut interactor = AdaptiveInteractor::new(&adapter);

        assert!(interactor.safe_click("#go", ""));
        assert_eq!(interactor.interaction_log()[0].method, InteractionMethod::HumanTyping);
    }

    #[test]
    fn test_click_mouse_event_tier_logged_as_js_inject() {
        // Everything fails except the final MouseEvent dispatch
        let adapter = ScriptedAdapter::new().js(&[false, true]);
        let mut interactor = AdaptiveInteractor::new(&adapter);

        assert!(interactor.safe_click("#go", ""));
        assert_eq!(interactor.interaction_log()[0].method, InteractionMethod::JsInject);
    }

    #[test]
    fn test_click_degraded() {
        let adapter = ScriptedAdapter::new().js(&[false, false]);
        let mut interactor = AdaptiveInteractor::new(&adapter);

        assert!(!interactor.safe_click("#go", ""));
        assert_eq!(interactor.interaction_log()[0].method, InteractionMethod::Degraded);
    }

    #[test]
    fn test_stats_and_clear() {
        let adapter = ScriptedAdapter { fill_ok: true, click_ok: true, ..ScriptedAdapter::new() };
        let mut interactor = AdaptiveInteractor::new(&adapter);

        interactor.safe_fill("#a", "x", "");
        interactor.safe_click("#b", "");
        interactor.safe_navigate("https://example.com");

        let stats = interactor.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_method["direct"], 2);
        assert_eq!(stats.by_method["degraded"], 1);
        assert_eq!(stats.failed, 1);

        interactor.clear_log();
        assert_eq!(interactor.stats().total, 0);
    }

    #[test]
    fn test_scripts_escape_selector() {
        let script = fill_script("input[name=\"q\"]", "it's");
        assert!(script.contains("\\\"q\\\""));
        assert!(script.contains("it's"));

        let script = click_script("#plain");
        assert!(script.contains("\"#plain\""));
    }
}
