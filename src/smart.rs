use crate::adapter::FrameworkAdapter;
use crate::error::Result;
use crate::heal::LocatorHealingEngine;

/// A locator that heals itself when it stops matching.
///
/// Wraps a locator string together with an adapter and a healing engine.
/// Actions that fail trigger the repair pipeline with the page's current
/// markup; a repaired locator replaces the current one and the action is
/// retried. When the pipeline returns the locator unchanged, the original
/// error propagates.
pub struct SmartLocator<'a> {
    original: String,
    current: String,
    context_hint: String,
    adapter: &'a dyn FrameworkAdapter,
    engine: &'a mut LocatorHealingEngine,
    max_heals: u32,
    healed: bool,
}

impl<'a> SmartLocator<'a> {
    pub fn new(
        locator: impl Into<String>,
        context_hint: impl Into<String>,
        adapter: &'a dyn FrameworkAdapter,
        engine: &'a mut LocatorHealingEngine,
    ) -> Self {
        let locator = locator.into();
        Self {
            original: locator.clone(),
            current: locator,
            context_hint: context_hint.into(),
            adapter,
            engine,
            max_heals: 1,
            healed: false,
        }
    }

    /// Builder method: how many heal-and-retry rounds a failing action gets
    pub fn max_heals(mut self, max_heals: u32) -> Self {
        self.max_heals = max_heals;
        self
    }

    pub fn click(&mut self) -> Result<()> {
        self.with_healing(|adapter, locator| adapter.click(locator))
    }

    pub fn fill(&mut self, value: &str) -> Result<()> {
        self.with_healing(|adapter, locator| adapter.fill(locator, value))
    }

    pub fn text(&mut self) -> Result<String> {
        self.with_healing(|adapter, locator| adapter.get_text(locator))
    }

    pub fn is_visible(&mut self) -> Result<bool> {
        self.with_healing(|adapter, locator| adapter.is_visible(locator))
    }

    /// Resolve the element without acting on it
    pub fn find(&mut self) -> Result<()> {
        self.with_healing(|adapter, locator| adapter.find_element(locator))
    }

    fn with_healing<T>(
        &mut self,
        action: impl Fn(&dyn FrameworkAdapter, &str) -> Result<T>,
    ) -> Result<T> {
        let mut heals = 0u32;
        loop {
            match action(self.adapter, &self.current) {
                Ok(value) => return Ok(value),
                Err(e) if heals < self.max_heals => {
                    log::info!("Locator '{}' failed ({}), attempting heal", self.current, e);
                    let page_source = self.adapter.page_source().unwrap_or_default();
                    let outcome = self.engine.heal(
                        self.adapter.framework(),
                        &page_source,
                        &self.current,
                        &self.context_hint,
                    );

                    if outcome.locator == self.current {
                        return Err(e);
                    }

                    log::info!(
                        "Healed '{}' -> '{}' via {}",
                        self.current,
                        outcome.locator,
                        outcome.source
                    );
                    self.current = outcome.locator;
                    self.healed = true;
                    heals += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// The locator in use right now, possibly a healed replacement
    pub fn current_locator(&self) -> &str {
        &self.current
    }

    pub fn original_locator(&self) -> &str {
        &self.original
    }

    pub fn was_healed(&self) -> bool {
        self.healed
    }

    /// Forget any healed replacement and go back to the original locator
    pub fn reset(&mut self) {
        self.current = self.original.clone();
        self.healed = false;
    }
}
