use std::sync::Arc;

use headless_chrome::{Element, Tab};

use crate::adapter::{Framework, FrameworkAdapter};
use crate::error::{HealError, Result};

/// Framework adapter over a Chrome DevTools Protocol tab.
///
/// Translates the supported locator dialects onto CDP primitives:
/// `//`-prefixed strings resolve as XPath, `text=` shorthand becomes a
/// contains-text XPath, everything else is a CSS selector.
pub struct CdpAdapter {
    tab: Arc<Tab>,
    framework: Framework,
}

enum Dialect {
    Css,
    XPath,
    Text,
}

impl CdpAdapter {
    pub fn new(tab: Arc<Tab>, framework: Framework) -> Self {
        Self { tab, framework }
    }

    /// The underlying tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    fn dialect(locator: &str) -> Dialect {
        if locator.starts_with("//") || locator.starts_with("(//") {
            Dialect::XPath
        } else if locator.starts_with("text=") {
            Dialect::Text
        } else {
            Dialect::Css
        }
    }

    fn text_to_xpath(locator: &str) -> String {
        let text = locator.trim_start_matches("text=");
        format!("//*[contains(text(), '{}')]", text)
    }

    fn resolve(&self, locator: &str) -> Result<Element<'_>> {
        let result = match Self::dialect(locator) {
            Dialect::Css => self.tab.find_element(locator),
            Dialect::XPath => self.tab.find_element_by_xpath(locator),
            Dialect::Text => self.tab.find_element_by_xpath(&Self::text_to_xpath(locator)),
        };

        result.map_err(|e| HealError::ElementNotFound {
            locator: locator.to_string(),
            reason: e.to_string(),
        })
    }

    /// JavaScript expression that evaluates to the element or null
    fn lookup_js(locator: &str) -> String {
        match Self::dialect(locator) {
            Dialect::Css => format!(
                "document.querySelector({})",
                serde_json::Value::String(locator.to_string())
            ),
            Dialect::XPath => Self::xpath_lookup_js(locator),
            Dialect::Text => Self::xpath_lookup_js(&Self::text_to_xpath(locator)),
        }
    }

    fn xpath_lookup_js(xpath: &str) -> String {
        format!(
            "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            serde_json::Value::String(xpath.to_string())
        )
    }
}

impl FrameworkAdapter for CdpAdapter {
    fn framework(&self) -> Framework {
        self.framework
    }

    fn page_source(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| HealError::Browser(format!("Failed to get page content: {}", e)))
    }

    fn find_element(&self, locator: &str) -> Result<()> {
        self.resolve(locator).map(|_| ())
    }

    fn click(&self, locator: &str) -> Result<()> {
        self.resolve(locator)?
            .click()
            .map_err(|e| HealError::Browser(format!("Click on '{}' failed: {}", locator, e)))?;
        Ok(())
    }

    fn fill(&self, locator: &str, value: &str) -> Result<()> {
        let element = self.resolve(locator)?;

        // Focus, clear any existing content, then type the replacement
        element.click().ok();
        self.tab.press_key("End").ok();
        for _ in 0..value.len() + 100 {
            self.tab.press_key("Backspace").ok();
        }

        element
            .type_into(value)
            .map_err(|e| HealError::Browser(format!("Fill of '{}' failed: {}", locator, e)))?;
        Ok(())
    }

    fn get_text(&self, locator: &str) -> Result<String> {
        let js = format!(
            "(function() {{ const el = {}; return el ? el.textContent : null; }})()",
            Self::lookup_js(locator)
        );

        let result = self
            .tab
            .evaluate(&js, false)
            .map_err(|e| HealError::Browser(format!("Text lookup failed: {}", e)))?;

        match result.value {
            Some(serde_json::Value::String(text)) => Ok(text),
            _ => Err(HealError::ElementNotFound {
                locator: locator.to_string(),
                reason: "No text content".to_string(),
            }),
        }
    }

    fn is_visible(&self, locator: &str) -> Result<bool> {
        let js = format!(
            "(function() {{
                const el = {};
                if (!el) return false;
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return rect.width > 0 && rect.height > 0
                    && style.display !== 'none' && style.visibility !== 'hidden';
            }})()",
            Self::lookup_js(locator)
        );

        self.evaluate_bool(&js)
    }

    fn evaluate_bool(&self, script: &str) -> Result<bool> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| HealError::Browser(format!("Script evaluation failed: {}", e)))?;

        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    fn focus(&self, locator: &str) -> Result<()> {
        let js = format!(
            "(function() {{ const el = {}; if (!el) return false; el.focus(); return true; }})()",
            Self::lookup_js(locator)
        );

        if self.evaluate_bool(&js)? {
            Ok(())
        } else {
            Err(HealError::ElementNotFound {
                locator: locator.to_string(),
                reason: "Focus target missing".to_string(),
            })
        }
    }

    fn press_key(&self, key: &str) -> Result<()> {
        self.tab
            .press_key(key)
            .map_err(|e| HealError::Browser(format!("Key press '{}' failed: {}", key, e)))?;
        Ok(())
    }

    fn type_text(&self, locator: &str, text: &str) -> Result<()> {
        self.resolve(locator)?
            .type_into(text)
            .map_err(|e| HealError::Browser(format!("Typing into '{}' failed: {}", locator, e)))?;
        Ok(())
    }

    fn get_attribute(&self, locator: &str, name: &str) -> Result<Option<String>> {
        let js = format!(
            "(function() {{ const el = {}; return el ? el.getAttribute({}) : null; }})()",
            Self::lookup_js(locator),
            serde_json::Value::String(name.to_string())
        );

        let result = self
            .tab
            .evaluate(&js, false)
            .map_err(|e| HealError::Browser(format!("Attribute lookup failed: {}", e)))?;

        match result.value {
            Some(serde_json::Value::String(value)) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| HealError::Browser(format!("Failed to navigate to {}: {}", url, e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| HealError::Browser(format!("Navigation timeout: {}", e)))?;
        Ok(())
    }
}
