//! Framework adapter seam.
//!
//! The healing and interaction layers never touch a browser directly; they
//! go through [`FrameworkAdapter`], which models the minimal surface of a
//! UI test framework. [`CdpAdapter`] is the built-in implementation over
//! Chrome DevTools Protocol.

mod cdp;

pub use cdp::CdpAdapter;

use serde::{Deserialize, Serialize};

use crate::error::{HealError, Result};

/// Locator dialect the adapter speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Playwright,
    Selenium,
}

impl Framework {
    /// Stable lowercase name, used in cache keys and log records
    pub fn name(&self) -> &'static str {
        match self {
            Framework::Playwright => "playwright",
            Framework::Selenium => "selenium",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Driver abstraction for a UI test framework.
///
/// Required methods cover the healing pipeline; the extended methods are
/// what the interaction tiers need, and default to [`HealError::Unsupported`]
/// so tiers degrade deterministically on adapters that lack them.
pub trait FrameworkAdapter {
    /// The locator dialect this adapter serves
    fn framework(&self) -> Framework;

    /// Full markup of the current page
    fn page_source(&self) -> Result<String>;

    /// Resolve a locator; `Ok(())` means the element exists
    fn find_element(&self, locator: &str) -> Result<()>;

    /// Click the element behind the locator
    fn click(&self, locator: &str) -> Result<()>;

    /// Replace the element's value with the given text
    fn fill(&self, locator: &str, value: &str) -> Result<()>;

    /// Text content of the element
    fn get_text(&self, locator: &str) -> Result<String>;

    /// Whether the element is currently visible
    fn is_visible(&self, locator: &str) -> Result<bool>;

    /// Evaluate a script that resolves to a boolean
    fn evaluate_bool(&self, _script: &str) -> Result<bool> {
        Err(self.unsupported("evaluate_bool"))
    }

    /// Give the element keyboard focus
    fn focus(&self, _locator: &str) -> Result<()> {
        Err(self.unsupported("focus"))
    }

    /// Press a named key (Enter, Backspace, ...) on the focused element
    fn press_key(&self, _key: &str) -> Result<()> {
        Err(self.unsupported("press_key"))
    }

    /// Type text into the focused element as individual keystrokes
    fn type_text(&self, _locator: &str, _text: &str) -> Result<()> {
        Err(self.unsupported("type_text"))
    }

    /// Read an attribute value from the element
    fn get_attribute(&self, _locator: &str, _name: &str) -> Result<Option<String>> {
        Err(self.unsupported("get_attribute"))
    }

    /// Navigate to a URL
    fn navigate(&self, _url: &str) -> Result<()> {
        Err(self.unsupported("navigate"))
    }

    #[doc(hidden)]
    fn unsupported(&self, operation: &str) -> HealError {
        HealError::Unsupported {
            operation: operation.to_string(),
            framework: self.framework().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BareAdapter;

    impl FrameworkAdapter for BareAdapter {
        fn framework(&self) -> Framework {
            Framework::Selenium
        }
        fn page_source(&self) -> Result<String> {
            Ok(String::new())
        }
        fn find_element(&self, _locator: &str) -> Result<()> {
            Ok(())
        }
        fn click(&self, _locator: &str) -> Result<()> {
            Ok(())
        }
        fn fill(&self, _locator: &str, _value: &str) -> Result<()> {
            Ok(())
        }
        fn get_text(&self, _locator: &str) -> Result<String> {
            Ok(String::new())
        }
        fn is_visible(&self, _locator: &str) -> Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_framework_name() {
        assert_eq!(Framework::Playwright.name(), "playwright");
        assert_eq!(Framework::Selenium.to_string(), "selenium");
    }

    #[test]
    fn test_framework_serde() {
        let json = serde_json::to_string(&Framework::Playwright).unwrap();
        assert_eq!(json, "\"playwright\"");
    }

    #[test]
    fn test_extended_methods_default_to_unsupported() {
        let adapter = BareAdapter;
        let err = adapter.focus("#btn").unwrap_err();
        assert!(matches!(err, HealError::Unsupported { .. }));
        assert!(adapter.press_key("Enter").is_err());
        assert!(adapter.evaluate_bool("true").is_err());
        assert!(adapter.navigate("https://example.com").is_err());
    }
}
