use crate::errors::{E2eError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Everything a suite run needs: where the site lives, what to search
/// for, how the browser is launched, and the wait budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    pub base_url: String,
    /// Location typed into the typeahead, "City, ST" form.
    pub location: String,
    pub browser: BrowserConfig,
    pub waits: WaitBudgets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
    pub launch_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Bounded-wait budgets, in milliseconds. The three named budgets
/// (page-ready, suggestion, results) come from the product flows; the
/// rest are the generic defaults used everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitBudgets {
    pub page_ready_ms: u64,
    pub suggestion_ms: u64,
    pub results_ms: u64,
    pub control_ms: u64,
    pub network_quiet_ms: u64,
    pub network_budget_ms: u64,
    pub poll_interval_ms: u64,
    pub key_delay_ms: u64,
    pub case_budget_ms: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://search.homestory.co/".to_string(),
            location: "Houston, TX".to_string(),
            browser: BrowserConfig::default(),
            waits: WaitBudgets::default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            args: vec![],
            launch_timeout_ms: 30000,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Default for WaitBudgets {
    fn default() -> Self {
        Self {
            page_ready_ms: 60000,
            suggestion_ms: 10000,
            results_ms: 60000,
            control_ms: 30000,
            network_quiet_ms: 500,
            network_budget_ms: 30000,
            poll_interval_ms: 50,
            key_delay_ms: 100,
            case_budget_ms: 120000,
        }
    }
}

impl SuiteConfig {
    /// Validate the parts that would otherwise fail deep inside a run.
    pub fn validated(self) -> Result<Self> {
        Url::parse(&self.base_url)
            .map_err(|e| E2eError::ConfigurationError(format!("invalid base URL: {e}")))?;
        if self.location.trim().is_empty() {
            return Err(E2eError::ConfigurationError(
                "location must not be empty".to_string(),
            ));
        }
        Ok(self)
    }

    /// Split the configured location into city and state parts.
    /// "Houston, TX" yields ("Houston", Some("TX")).
    pub fn location_parts(&self) -> (String, Option<String>) {
        match self.location.split_once(',') {
            Some((city, state)) => (city.trim().to_string(), {
                let state = state.trim();
                (!state.is_empty()).then(|| state.to_string())
            }),
            None => (self.location.trim().to_string(), None),
        }
    }
}

impl WaitBudgets {
    pub fn page_ready(&self) -> Duration {
        Duration::from_millis(self.page_ready_ms)
    }

    pub fn suggestion(&self) -> Duration {
        Duration::from_millis(self.suggestion_ms)
    }

    pub fn results(&self) -> Duration {
        Duration::from_millis(self.results_ms)
    }

    pub fn control(&self) -> Duration {
        Duration::from_millis(self.control_ms)
    }

    pub fn network_quiet(&self) -> Duration {
        Duration::from_millis(self.network_quiet_ms)
    }

    pub fn network_budget(&self) -> Duration {
        Duration::from_millis(self.network_budget_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }

    pub fn case_budget(&self) -> Duration {
        Duration::from_millis(self.case_budget_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SuiteConfig::default().validated();
        assert!(config.is_ok());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = SuiteConfig {
            base_url: "not a url".to_string(),
            ..SuiteConfig::default()
        };
        assert!(matches!(
            config.validated(),
            Err(E2eError::ConfigurationError(_))
        ));
    }

    #[test]
    fn location_splits_into_city_and_state() {
        let config = SuiteConfig::default();
        let (city, state) = config.location_parts();
        assert_eq!(city, "Houston");
        assert_eq!(state.as_deref(), Some("TX"));
    }

    #[test]
    fn location_without_state_keeps_city_only() {
        let config = SuiteConfig {
            location: "Houston".to_string(),
            ..SuiteConfig::default()
        };
        let (city, state) = config.location_parts();
        assert_eq!(city, "Houston");
        assert!(state.is_none());
    }
}
