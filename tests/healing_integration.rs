//! End-to-end tests for the healing pipeline: engine, cache persistence,
//! visual fallback and the smart locator wrapper working together.

use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbImage};
use locator_heal::{
    AdaptiveInteractor, AiGateway, Framework, FrameworkAdapter, HealError, HealSource,
    HealerOptions, InteractionMethod, LocatorHealingEngine, Result, SmartLocator, VisionOptions,
};
use tempfile::tempdir;

/// Gateway returning fixed responses, counting calls
struct MockGateway {
    chat_response: Result<String>,
    vision_response: Result<String>,
    chat_calls: RefCell<u32>,
    vision_calls: RefCell<u32>,
}

impl MockGateway {
    fn chat(response: &str) -> Self {
        Self {
            chat_response: Ok(response.to_string()),
            vision_response: Err(HealError::Gateway("no vision".to_string())),
            chat_calls: RefCell::new(0),
            vision_calls: RefCell::new(0),
        }
    }

    fn chat_down_vision(response: &str) -> Self {
        Self {
            chat_response: Err(HealError::Gateway("down".to_string())),
            vision_response: Ok(response.to_string()),
            chat_calls: RefCell::new(0),
            vision_calls: RefCell::new(0),
        }
    }
}

impl AiGateway for MockGateway {
    fn ask(&self, _prompt: &str) -> Result<String> {
        *self.chat_calls.borrow_mut() += 1;
        match &self.chat_response {
            Ok(s) => Ok(s.clone()),
            Err(_) => Err(HealError::Gateway("down".to_string())),
        }
    }

    fn ask_vision(&self, _images: &[&Path], _question: &str) -> Result<String> {
        *self.vision_calls.borrow_mut() += 1;
        match &self.vision_response {
            Ok(s) => Ok(s.clone()),
            Err(_) => Err(HealError::Gateway("no vision".to_string())),
        }
    }
}

/// Adapter backed by a fixed set of working locators
struct StaticPage {
    working: Vec<String>,
    clicks: RefCell<Vec<String>>,
}

impl StaticPage {
    fn with(locators: &[&str]) -> Self {
        Self {
            working: locators.iter().map(|s| s.to_string()).collect(),
            clicks: RefCell::new(Vec::new()),
        }
    }

    fn check(&self, locator: &str) -> Result<()> {
        if self.working.iter().any(|l| l == locator) {
            Ok(())
        } else {
            Err(HealError::ElementNotFound {
                locator: locator.to_string(),
                reason: "not on page".to_string(),
            })
        }
    }
}

impl FrameworkAdapter for StaticPage {
    fn framework(&self) -> Framework {
        Framework::Playwright
    }
    fn page_source(&self) -> Result<String> {
        Ok("<html><body><button id='new-button'>Submit</button></body></html>".to_string())
    }
    fn find_element(&self, locator: &str) -> Result<()> {
        self.check(locator)
    }
    fn click(&self, locator: &str) -> Result<()> {
        self.check(locator)?;
        self.clicks.borrow_mut().push(locator.to_string());
        Ok(())
    }
    fn fill(&self, locator: &str, _value: &str) -> Result<()> {
        self.check(locator)
    }
    fn get_text(&self, locator: &str) -> Result<String> {
        self.check(locator)?;
        Ok("Submit".to_string())
    }
    fn is_visible(&self, locator: &str) -> Result<bool> {
        Ok(self.check(locator).is_ok())
    }
}

fn options(dir: &Path) -> HealerOptions {
    HealerOptions::new()
        .log_path(dir.join("healing_log.json"))
        .cache_path(dir.join("healing_cache.json"))
        .max_attempts(1)
}

#[test]
fn heals_broken_locator_then_serves_from_cache() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::chat("```css\n#new-button\n```"));
    let mut engine = LocatorHealingEngine::new(gateway.clone(), options(dir.path()));

    let page = "<html><button id='new-button'>Submit</button></html>";

    let first = engine.heal(Framework::Playwright, page, "#old-button", "Submit button");
    assert_eq!(first.locator, "#new-button");
    assert_eq!(first.source, HealSource::Ai);

    let second = engine.heal(Framework::Playwright, page, "#old-button", "Submit button");
    assert_eq!(second.locator, "#new-button");
    assert_eq!(second.source, HealSource::Cache);

    assert_eq!(*gateway.chat_calls.borrow(), 1, "one model call per unique request");

    let stats = engine.healing_stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.success_rate, 1.0);
    assert_eq!(stats.cache_hit_rate, 0.5);
}

#[test]
fn cache_survives_engine_restart() {
    let dir = tempdir().unwrap();

    {
        let gateway = Arc::new(MockGateway::chat("#new-button"));
        let mut engine = LocatorHealingEngine::new(gateway, options(dir.path()));
        engine.heal(Framework::Playwright, "", "#old-button", "Submit");
    }

    let gateway = Arc::new(MockGateway::chat("#should-not-be-asked"));
    let mut engine = LocatorHealingEngine::new(gateway.clone(), options(dir.path()));

    let outcome = engine.heal(Framework::Playwright, "", "#old-button", "Submit");
    assert_eq!(outcome.locator, "#new-button");
    assert_eq!(outcome.source, HealSource::Cache);
    assert_eq!(*gateway.chat_calls.borrow(), 0);
}

#[test]
fn heuristic_rescues_when_model_is_down() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::chat_down_vision("unused"));
    let mut engine = LocatorHealingEngine::new(gateway, options(dir.path()));

    let outcome = engine.heal(Framework::Selenium, "", "#broken", "Submit order");
    assert_eq!(outcome.locator, "//button[@type='submit']");
    assert_eq!(outcome.source, HealSource::Fallback);

    // The heuristic repair is memoized like any other
    let again = engine.heal(Framework::Selenium, "", "#broken", "Submit order");
    assert_eq!(again.source, HealSource::Cache);
}

#[test]
fn visual_fallback_suggests_text_locator() {
    let dir = tempdir().unwrap();

    // Baseline all white, current has a 40x40 black block: similarity 0.84
    let baseline_path = dir.path().join("baseline.png");
    let current_path = dir.path().join("current.png");
    RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]))
        .save(&baseline_path)
        .unwrap();
    let mut current = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
    for y in 10..50 {
        for x in 10..50 {
            current.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
    current.save(&current_path).unwrap();

    let gateway = Arc::new(MockGateway::chat_down_vision(
        "The button moved. A text= locator would be robust here.",
    ));
    let opts = options(dir.path()).vision(
        VisionOptions::new(&baseline_path, &current_path)
            .threshold(0.85)
            .cache_dir(dir.path().join("vision")),
    );
    let mut engine = LocatorHealingEngine::new(gateway.clone(), opts);

    // Empty hint: AI is down, heuristic has nothing, vision takes over
    let outcome = engine.heal(Framework::Playwright, "", "#gone", "");
    assert_eq!(outcome.source, HealSource::Vision);
    assert_eq!(outcome.locator, "text=");
    assert_eq!(*gateway.vision_calls.borrow(), 1);
}

#[test]
fn exhausted_pipeline_returns_identity() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::chat_down_vision("nothing useful"));
    let mut engine = LocatorHealingEngine::new(gateway, options(dir.path()));

    // No hint and no vision configured: nothing can repair this
    let outcome = engine.heal(Framework::Playwright, "", "#gone", "");
    assert_eq!(outcome.locator, "#gone");

    let records = engine.recent_healings(1);
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
    assert_eq!(records[0].new_locator, records[0].old_locator);
}

#[test]
fn smart_locator_heals_and_interactor_clicks() {
    let dir = tempdir().unwrap();
    let page = StaticPage::with(&["#new-button"]);
    let gateway = Arc::new(MockGateway::chat("#new-button"));
    let mut engine = LocatorHealingEngine::new(gateway, options(dir.path()));

    let healed = {
        let mut locator = SmartLocator::new("#old-button", "Submit button", &page, &mut engine);
        locator.find().unwrap();
        assert!(locator.was_healed());
        locator.current_locator().to_string()
    };
    assert_eq!(healed, "#new-button");

    let mut interactor = AdaptiveInteractor::new(&page);
    assert!(interactor.safe_click(&healed, "Submit button"));
    assert_eq!(*page.clicks.borrow(), vec!["#new-button".to_string()]);

    let log = interactor.interaction_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].method, InteractionMethod::Direct);
    assert!(!log[0].failed);
}

#[test]
fn healing_log_is_appended_across_engines() {
    let dir = tempdir().unwrap();

    {
        let gateway = Arc::new(MockGateway::chat("#a"));
        let mut engine = LocatorHealingEngine::new(gateway, options(dir.path()));
        engine.heal(Framework::Playwright, "", "#x", "hint");
    }
    {
        let gateway = Arc::new(MockGateway::chat("#b"));
        let mut engine = LocatorHealingEngine::new(gateway, options(dir.path()));
        engine.heal(Framework::Selenium, "", "#y", "hint");

        let stats = engine.healing_stats();
        assert_eq!(stats.total, 2);
    }
}
