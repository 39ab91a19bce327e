use thiserror::Error;

/// Errors that can occur during locator healing and browser interaction
#[derive(Debug, Error)]
pub enum HealError {
    /// Invalid or incomplete configuration (missing API key, bad provider)
    #[error("Configuration error: {0}")]
    Config(String),

    /// AI gateway request failed (network, HTTP status, malformed response)
    #[error("Gateway request failed: {0}")]
    Gateway(String),

    /// Element could not be located on the page
    #[error("Element '{locator}' not found: {reason}")]
    ElementNotFound { locator: String, reason: String },

    /// Operation not supported by the active framework adapter
    #[error("Operation '{operation}' not supported by {framework} adapter")]
    Unsupported { operation: String, framework: String },

    /// Browser-level failure (navigation, evaluation, input)
    #[error("Browser operation failed: {0}")]
    Browser(String),

    /// Image decoding or comparison failed
    #[error("Image comparison failed: {0}")]
    ImageCompare(String),

    /// Image codec error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for locator healing operations
pub type Result<T> = std::result::Result<T, HealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HealError::ElementNotFound {
            locator: "#submit".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Element '#submit' not found: timeout");

        let err = HealError::Config("missing API key".to_string());
        assert!(err.to_string().contains("missing API key"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: HealError = json_err.into();
        assert!(matches!(err, HealError::Json(_)));
    }

    #[test]
    fn test_unsupported_display() {
        let err = HealError::Unsupported {
            operation: "press_key".to_string(),
            framework: "selenium".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Operation 'press_key' not supported by selenium adapter"
        );
    }
}
