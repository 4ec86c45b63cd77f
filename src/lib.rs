//! # eoka-shelf
//!
//! Resilient storefront checks on top of eoka. Seeds locale cookies, sets a
//! delivery ZIP through a flaky location popover, drills into a category via
//! the hamburger menu and asserts the price of the second "Best Sellers" item
//! against a threshold.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eoka_shelf::{Config, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> eoka_shelf::Result<()> {
//! let config = Config::load("configs/bestseller.yaml")?;
//! let mut runner = Runner::new(&config.browser).await?;
//! let result = runner.run(&config).await?;
//! println!("Success: {} ({:?})", result.success, result.price);
//! runner.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The flows are generic over [`Driver`], so they run the same against a live
//! eoka page ([`EokaDriver`]) or a scripted page in tests.

pub mod click;
mod config;
pub mod dom;
pub mod driver;
pub mod flows;
pub mod price;
mod runner;

pub use click::{Activation, ActivationPath, ClickProtocol};
pub use config::{
    BrowserConfig, ClickConfig, Config, ExtractionConfig, LocationConfig, NavigationConfig,
    OnFailure, ParamDef, Params, RetryConfig, SiteSelectors, TargetUrl, Timeouts, Viewport,
};
pub use driver::{Driver, EokaDriver, Locator, SeedCookie};
pub use price::{parse_price, PriceFragments};
pub use runner::{run_scenario, save_failure_screenshot, RunResult, Runner, ScenarioOutcome};

use std::fmt;

/// Result type for eoka-shelf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Scenario phase, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Location,
    Navigation,
    Extraction,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Setup => "setup",
            Phase::Location => "location-set",
            Phase::Navigation => "navigation",
            Phase::Extraction => "extraction",
        })
    }
}

/// Errors that can occur during config loading or a scenario run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("action failed: {0}")]
    ActionFailed(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// An element the flow depends on is not on the page.
    #[error("element missing: {0}")]
    ElementMissing(String),

    #[error("dialog did not close after {attempts} attempts; overlay may be persistent")]
    OverlayPersistent { attempts: u32 },

    #[error("best-seller module not found: {0}")]
    ModuleNotFound(String),

    #[error("best-seller module has fewer than two priced items (found {found})")]
    TooFewPricedItems { found: usize },

    #[error("best-seller item #{position} has no visible price")]
    PriceMissing { position: usize },

    #[error("best-seller item #{position} shows an out-of-range price '{shown}'")]
    PriceOutOfRange { position: usize, shown: String },

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("{phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Tag an error with the phase it happened in. Already-tagged errors keep
    /// their original phase.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            Error::Phase { .. } => self,
            other => Error::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// Phase this error was raised in, if tagged.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.name, "Test");
        assert_eq!(config.target.url, "https://example.com");
        assert!(config.cookies.is_empty());
        assert_eq!(config.location.zip, "10001");
        assert_eq!(config.extraction.threshold, Decimal::from(100));
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_parse_browser_config() {
        let yaml = r#"
name: "Test"
browser:
  headless: true
  proxy: "http://localhost:8080"
  user_agent: "Custom UA"
  viewport:
    width: 1920
    height: 1080
target:
  url: "https://example.com"
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.browser.proxy, Some("http://localhost:8080".into()));
        assert_eq!(config.browser.user_agent, Some("Custom UA".into()));
        let viewport = config.browser.viewport.unwrap();
        assert_eq!(viewport.width, 1920);
        assert_eq!(viewport.height, 1080);
    }

    #[test]
    fn test_parse_cookies_and_navigation() {
        let yaml = r#"
name: "Test"
target:
  url: "https://www.amazon.com"
cookies:
  - name: i18n-prefs
    value: USD
    domain: .amazon.com
    path: /
  - name: lc-main
    value: en_US
navigation:
  department: "^Books$"
  category: "Fiction"
  url_pattern: "/b/"
  landing: "Fiction"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.cookies.len(), 2);
        assert_eq!(config.cookies[0].domain.as_deref(), Some(".amazon.com"));
        assert_eq!(config.cookies[1].path, None);
        assert_eq!(config.navigation.department, "^Books$");
        assert!(config.navigation.url_regex().unwrap().is_match("https://x/b/?node=1"));
    }

    #[test]
    fn test_default_timeouts() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.timeouts.action_ms, 2000);
        assert_eq!(config.timeouts.navigation_ms, 5000);
        assert_eq!(config.timeouts.expect_ms, 8000);
        assert_eq!(config.timeouts.location_update_ms, 20_000);
        assert_eq!(config.timeouts.scenario_ms, 30_000);
        assert_eq!(config.click.max_attempts, 3);
        assert_eq!(config.selectors.blocker, ".glux-desktop-ui-blocker");
    }

    #[test]
    fn test_parse_threshold_from_string_and_number() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
extraction:
  threshold: "99.50"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(
            config.extraction.threshold,
            Decimal::from_str("99.50").unwrap()
        );

        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
extraction:
  threshold: 250
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.extraction.threshold, Decimal::from(250));
    }

    #[test]
    fn test_parse_selector_overrides() {
        let yaml = r##"
name: "Test"
target:
  url: "https://example.com"
selectors:
  menu_trigger: "#burger"
  price: ".price"
"##;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.selectors.menu_trigger, "#burger");
        assert_eq!(config.selectors.price, ".price");
        // untouched fields keep their defaults
        assert_eq!(config.selectors.location_link, "#nav-global-location-popover-link");
    }

    #[test]
    fn test_parse_on_failure() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
on_failure:
  screenshot: "error.png"
  retry:
    attempts: 3
    delay_ms: 1000
"#;
        let config = Config::parse(yaml).unwrap();
        let on_failure = config.on_failure.unwrap();
        assert_eq!(on_failure.screenshot, Some("error.png".into()));
        let retry = on_failure.retry.unwrap();
        assert_eq!(retry.attempts, 3);
        assert_eq!(retry.delay_ms, 1000);
    }

    #[test]
    fn test_validation_missing_name() {
        let yaml = r#"
target:
  url: "https://example.com"
"#;
        assert!(Config::parse(yaml).is_err());
    }

    #[test]
    fn test_validation_empty_url() {
        let yaml = r#"
name: "Test"
target:
  url: ""
"#;
        assert!(Config::parse(yaml).is_err());
    }

    #[test]
    fn test_validation_empty_zip() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
location:
  zip: ""
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("location.zip"));
    }

    #[test]
    fn test_validation_negative_threshold() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
extraction:
  threshold: "-1"
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn test_validation_bad_pattern() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
navigation:
  category: "TV ("
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("navigation.category"));
    }

    #[test]
    fn test_validation_zero_retry_attempts() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
on_failure:
  retry:
    attempts: 0
    delay_ms: 1000
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_validation_zero_click_attempts() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
click:
  max_attempts: 0
"#;
        assert!(Config::parse(yaml).is_err());
    }

    #[test]
    fn test_validation_zero_scenario_timeout() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
timeouts:
  scenario_ms: 0
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("timeouts.scenario_ms"));
    }

    #[test]
    fn test_params_substitution() {
        let yaml = r##"
name: "Check"
params:
  ZIP:
    required: true
  PRICE_THRESHOLD:
    default: "100"
target:
  url: "https://example.com"
location:
  zip: "${ZIP}"
extraction:
  threshold: "${PRICE_THRESHOLD}"
"##;
        let params = Params::new().set("ZIP", "94103").set("PRICE_THRESHOLD", "42.5");
        let config = Config::parse_with_params(yaml, &params).unwrap();
        assert_eq!(config.location.zip, "94103");
        assert_eq!(
            config.extraction.threshold,
            Decimal::from_str("42.5").unwrap()
        );
    }

    #[test]
    fn test_params_default_value() {
        let yaml = r##"
name: "Test"
params:
  SHELF_TEST_DEFAULT_ONLY:
    default: "https://default.example.com"
target:
  url: "${SHELF_TEST_DEFAULT_ONLY}"
"##;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.target.url, "https://default.example.com");
    }

    #[test]
    fn test_params_missing_required() {
        let yaml = r##"
name: "Test"
params:
  SHELF_TEST_REQUIRED_KEY:
    required: true
target:
  url: "https://example.com/${SHELF_TEST_REQUIRED_KEY}"
"##;
        let result = Config::parse(yaml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("SHELF_TEST_REQUIRED_KEY"));
    }

    #[test]
    fn test_load_bundled_config() {
        let config = Config::load("configs/bestseller.yaml").unwrap();
        assert_eq!(config.cookies.len(), 2);
        assert_eq!(config.navigation.department, "^Electronics$");
        assert!(config.params.contains_key("PRICE_THRESHOLD"));
    }

    #[test]
    fn test_phase_tagging() {
        let err = Error::TooFewPricedItems { found: 1 }.in_phase(Phase::Extraction);
        assert_eq!(err.phase(), Some(Phase::Extraction));
        assert_eq!(
            err.to_string(),
            "extraction failed: best-seller module has fewer than two priced items (found 1)"
        );

        // re-tagging keeps the innermost phase
        let err = err.in_phase(Phase::Setup);
        assert_eq!(err.phase(), Some(Phase::Extraction));
    }

    #[test]
    fn test_overlay_error_message() {
        let err = Error::OverlayPersistent { attempts: 3 };
        assert_eq!(
            err.to_string(),
            "dialog did not close after 3 attempts; overlay may be persistent"
        );
    }
}
