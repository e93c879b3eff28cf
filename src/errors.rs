use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript evaluation failed: {0}")]
    JavaScriptFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out after {budget_ms}ms waiting for {what}")]
    Timeout { what: String, budget_ms: u64 },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    BrowserError(String),
}

pub type Result<T> = std::result::Result<T, E2eError>;

// Chrome-side failures arrive as anyhow errors from headless_chrome.
impl From<anyhow::Error> for E2eError {
    fn from(err: anyhow::Error) -> Self {
        E2eError::BrowserError(err.to_string())
    }
}

impl E2eError {
    /// Timeout carrying the awaited condition, so a failure against the
    /// live site names exactly what never materialized.
    pub fn timeout(what: impl Into<String>, budget_ms: u64) -> Self {
        E2eError::Timeout {
            what: what.into(),
            budget_ms,
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        E2eError::AssertionFailed(message.into())
    }
}
