use crate::click::ClickProtocol;
use crate::config::{BrowserConfig, Config};
use crate::driver::wait::bounded;
use crate::driver::{Driver, EokaDriver};
use crate::flows::{
    second_best_seller_price, set_delivery_zip, CategoryPath, MenuNavigator,
};
use crate::price::format_usd;
use crate::{Error, Phase, Result};
use eoka::{Browser, Page};
use rust_decimal::Decimal;
use std::sync::{Mutex, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Price check result of one completed scenario run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub price: Decimal,
    pub threshold: Decimal,
    /// `price <= threshold`.
    pub passed: bool,
}

impl ScenarioOutcome {
    pub fn new(price: Decimal, threshold: Decimal) -> Self {
        Self {
            price,
            threshold,
            passed: price <= threshold,
        }
    }

    /// Turn a failed comparison into [`Error::AssertionFailed`].
    pub fn check(&self) -> Result<()> {
        if self.passed {
            return Ok(());
        }
        Err(Error::AssertionFailed(format!(
            "second best seller costs {}, above the {} threshold",
            format_usd(self.price),
            format_usd(self.threshold)
        )))
    }
}

/// Run the whole scenario once on `driver`.
///
/// Errors are tagged with the [`Phase`] they happened in. The attempt as a
/// whole is capped by `timeouts.scenario_ms`; hitting the cap is a
/// [`Error::Timeout`] tagged with the phase that was running. A price above
/// the threshold is not an error; it is reported through
/// [`ScenarioOutcome::passed`].
pub async fn run_scenario<D: Driver + ?Sized>(
    driver: &D,
    config: &Config,
) -> Result<ScenarioOutcome> {
    let current = Mutex::new(Phase::Setup);
    bounded(
        "scenario",
        config.timeouts.scenario(),
        run_phases(driver, config, &current),
    )
    .await
    .map_err(|e| {
        let phase = *current.lock().unwrap_or_else(PoisonError::into_inner);
        e.in_phase(phase)
    })
}

fn enter(current: &Mutex<Phase>, phase: Phase) {
    *current.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    debug!("entering {} phase", phase);
}

async fn run_phases<D: Driver + ?Sized>(
    driver: &D,
    config: &Config,
    current: &Mutex<Phase>,
) -> Result<ScenarioOutcome> {
    let timeouts = &config.timeouts;
    let selectors = &config.selectors;

    open_store(driver, config)
        .await
        .map_err(|e| e.in_phase(Phase::Setup))?;

    enter(current, Phase::Location);
    let protocol = ClickProtocol::from_config(&config.click, selectors);
    let change = set_delivery_zip(driver, selectors, timeouts, &protocol, &config.location)
        .await
        .map_err(|e| e.in_phase(Phase::Location))?;
    debug!("location change: {:?}", change);

    enter(current, Phase::Navigation);
    go_to_category(driver, config)
        .await
        .map_err(|e| e.in_phase(Phase::Navigation))?;

    enter(current, Phase::Extraction);
    let price = second_best_seller_price(driver, selectors, timeouts)
        .await
        .map_err(|e| e.in_phase(Phase::Extraction))?;

    let outcome = ScenarioOutcome::new(price, config.extraction.threshold);
    if outcome.passed {
        info!(
            "Price {} is within threshold {}",
            format_usd(outcome.price),
            format_usd(outcome.threshold)
        );
    } else {
        warn!(
            "Price {} exceeds threshold {}",
            format_usd(outcome.price),
            format_usd(outcome.threshold)
        );
    }
    Ok(outcome)
}

/// Seed cookies, then load the home page.
async fn open_store<D: Driver + ?Sized>(driver: &D, config: &Config) -> Result<()> {
    for cookie in &config.cookies {
        driver.set_cookie(cookie).await?;
    }
    info!("Navigating to: {}", config.target.url);
    bounded(
        &config.target.url,
        config.timeouts.navigation(),
        driver.goto(&config.target.url),
    )
    .await
}

async fn go_to_category<D: Driver + ?Sized>(driver: &D, config: &Config) -> Result<String> {
    let path = CategoryPath::from_config(&config.navigation)?;
    let menu = MenuNavigator::new(driver, &config.selectors, &config.timeouts);
    let url = menu.go_to_category(&path).await?;
    Ok(url)
}

/// Write a screenshot to `on_failure.screenshot` with `{timestamp}`
/// substituted. Best effort; returns the path written.
pub async fn save_failure_screenshot<D: Driver + ?Sized>(
    driver: &D,
    config: &Config,
) -> Option<String> {
    let template = config.on_failure.as_ref()?.screenshot.as_ref()?;
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let path = template.replace("{timestamp}", &timestamp.to_string());
    info!("Saving failure screenshot to: {}", path);
    let data = match driver.screenshot().await {
        Ok(data) => data,
        Err(e) => {
            warn!("Failed to capture screenshot: {}", e);
            return None;
        }
    };
    if let Err(e) = std::fs::write(&path, data) {
        warn!("Failed to save screenshot: {}", e);
        return None;
    }
    Some(path)
}

/// Result of running a config.
#[derive(Debug)]
pub struct RunResult {
    /// Whether the price was within the threshold.
    pub success: bool,
    /// Extracted price, if the scenario got that far.
    pub price: Option<Decimal>,
    pub threshold: Decimal,
    /// Error message if failed.
    pub error: Option<String>,
    /// Phase the last error happened in.
    pub phase: Option<Phase>,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
    /// Number of retry attempts made.
    pub retries: u32,
}

/// Owns the browser for a scenario run.
pub struct Runner {
    browser: Browser,
    page: Page,
}

impl Runner {
    /// Launch a browser with the given config.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self { browser, page })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Run the scenario with retry support.
    ///
    /// Only errors are retried. A run that extracts a price above the
    /// threshold completes and fails without another attempt.
    pub async fn run(&mut self, config: &Config) -> Result<RunResult> {
        let start = Instant::now();
        let retry_config = config.on_failure.as_ref().and_then(|f| f.retry.as_ref());
        let max_attempts = retry_config.map(|r| r.attempts).unwrap_or(1);
        let retry_delay = retry_config.map(|r| r.delay_ms).unwrap_or(0);
        let threshold = config.extraction.threshold;

        let mut last_error = None;
        let mut last_phase = None;
        let mut retries = 0;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                retries += 1;
                info!("Retry attempt {}/{}", attempt, max_attempts);
                if retry_delay > 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(retry_delay)).await;
                }
            }

            let driver = EokaDriver::new(&self.page);
            match run_scenario(&driver, config).await {
                Ok(outcome) => {
                    let error = outcome.check().err().map(|e| e.to_string());
                    if !outcome.passed {
                        self.handle_failure(config).await;
                    }
                    return Ok(RunResult {
                        success: outcome.passed,
                        price: Some(outcome.price),
                        threshold,
                        error,
                        phase: None,
                        duration_ms: start.elapsed().as_millis() as u64,
                        retries,
                    });
                }
                Err(e) => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    last_phase = e.phase();
                    last_error = Some(e.to_string());
                    if attempt == max_attempts {
                        self.handle_failure(config).await;
                    }
                }
            }
        }

        Ok(RunResult {
            success: false,
            price: None,
            threshold,
            error: last_error,
            phase: last_phase,
            duration_ms: start.elapsed().as_millis() as u64,
            retries,
        })
    }

    async fn handle_failure(&self, config: &Config) {
        save_failure_screenshot(&EokaDriver::new(&self.page), config).await;
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
