//! Deterministic locator suggestions from context hints.
//!
//! No AI involved: the hint is matched against a fixed keyword table and
//! mapped to a framework-specific locator template. Used when the AI repair
//! stage produced nothing usable.

use crate::adapter::Framework;

/// Trigger table, checked in order; the first category whose keywords match
/// the lowercased hint wins.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("submit", &["submit", "send", "save"]),
    ("cancel", &["cancel", "close", "dismiss"]),
    ("login", &["login", "sign in", "log in"]),
    ("button", &["button", "btn"]),
    ("input", &["input", "field", "textbox"]),
    ("link", &["link", "anchor"]),
    ("checkbox", &["checkbox", "check"]),
    ("radio", &["radio"]),
];

/// Suggest a locator for the given context hint, or `None` when the hint
/// is empty. Pure and deterministic.
pub fn suggest(context_hint: &str, framework: Framework) -> Option<String> {
    let hint = context_hint.trim();
    if hint.is_empty() {
        return None;
    }

    let lowered = hint.to_lowercase();

    for (category, keywords) in CATEGORIES {
        if let Some(keyword) = keywords.iter().find(|k| lowered.contains(**k)) {
            return Some(template(category, keyword, framework));
        }
    }

    // No category matched: build a text locator from the first word
    let word = hint.split_whitespace().next()?;
    Some(match framework {
        Framework::Playwright => format!("text={}", word),
        Framework::Selenium => format!("//*[contains(text(), '{}')]", word),
    })
}

fn template(category: &str, keyword: &str, framework: Framework) -> String {
    match framework {
        Framework::Playwright => match category {
            "submit" => "button[type='submit']".to_string(),
            "cancel" => "button:has-text('Cancel')".to_string(),
            "login" => "button:has-text('Login')".to_string(),
            "button" => format!("button:has-text('{}')", keyword),
            "input" => "input[type='text']".to_string(),
            "link" => format!("a:has-text('{}')", keyword),
            "checkbox" => "input[type='checkbox']".to_string(),
            _ => "input[type='radio']".to_string(),
        },
        Framework::Selenium => match category {
            "submit" => "//button[@type='submit']".to_string(),
            "cancel" => "//button[contains(text(), 'Cancel')]".to_string(),
            "login" => "//button[contains(text(), 'Login')]".to_string(),
            "button" => format!("//button[contains(text(), '{}')]", keyword),
            "input" => "//input[@type='text']".to_string(),
            "link" => format!("//a[contains(text(), '{}')]", keyword),
            "checkbox" => "//input[@type='checkbox']".to_string(),
            _ => "//input[@type='radio']".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hint_returns_none() {
        assert_eq!(suggest("", Framework::Playwright), None);
        assert_eq!(suggest("   ", Framework::Selenium), None);
    }

    #[test]
    fn test_submit_category() {
        assert_eq!(
            suggest("Submit the form", Framework::Playwright).unwrap(),
            "button[type='submit']"
        );
        assert_eq!(
            suggest("save button", Framework::Selenium).unwrap(),
            "//button[@type='submit']"
        );
    }

    #[test]
    fn test_category_order_submit_before_button() {
        // "submit button" matches submit first, not button
        assert_eq!(
            suggest("submit button", Framework::Playwright).unwrap(),
            "button[type='submit']"
        );
    }

    #[test]
    fn test_login_category() {
        assert_eq!(
            suggest("sign in here", Framework::Playwright).unwrap(),
            "button:has-text('Login')"
        );
        assert_eq!(
            suggest("Login", Framework::Selenium).unwrap(),
            "//button[contains(text(), 'Login')]"
        );
    }

    #[test]
    fn test_keyword_interpolating_categories() {
        assert_eq!(
            suggest("the btn on top", Framework::Playwright).unwrap(),
            "button:has-text('btn')"
        );
        assert_eq!(
            suggest("profile link", Framework::Selenium).unwrap(),
            "//a[contains(text(), 'link')]"
        );
    }

    #[test]
    fn test_input_and_checkbox_categories() {
        assert_eq!(
            suggest("email field", Framework::Playwright).unwrap(),
            "input[type='text']"
        );
        assert_eq!(
            suggest("terms checkbox", Framework::Selenium).unwrap(),
            "//input[@type='checkbox']"
        );
    }

    #[test]
    fn test_first_word_fallback() {
        assert_eq!(
            suggest("Username here", Framework::Playwright).unwrap(),
            "text=Username"
        );
        assert_eq!(
            suggest("Username here", Framework::Selenium).unwrap(),
            "//*[contains(text(), 'Username')]"
        );
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert_eq!(
            suggest("CANCEL", Framework::Playwright).unwrap(),
            "button:has-text('Cancel')"
        );
    }
}
