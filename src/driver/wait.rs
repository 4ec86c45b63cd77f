//! Bounded waits. Every wait polls until its condition holds or the bound
//! elapses, then fails with [`Error::Timeout`].

use super::{Driver, Locator};
use crate::{Error, Result};
use regex::Regex;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Interval between condition checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait for `target` to become visible.
pub async fn wait_for_visible<D: Driver + ?Sized>(
    driver: &D,
    target: &Locator,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();
    loop {
        if driver.is_visible(target).await? {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(Error::Timeout(format!(
                "{} not visible within {}ms",
                target,
                timeout.as_millis()
            )));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Wait for any of `targets` to become visible. Returns the index of the
/// first visible one.
pub async fn wait_for_any_visible<D: Driver + ?Sized>(
    driver: &D,
    targets: &[Locator],
    timeout: Duration,
) -> Result<usize> {
    let start = Instant::now();
    loop {
        for (i, target) in targets.iter().enumerate() {
            if driver.is_visible(target).await? {
                return Ok(i);
            }
        }
        if start.elapsed() >= timeout {
            let names: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
            return Err(Error::Timeout(format!(
                "none of [{}] visible within {}ms",
                names.join(", "),
                timeout.as_millis()
            )));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Wait for `target` to be hidden or detached.
pub async fn wait_for_hidden<D: Driver + ?Sized>(
    driver: &D,
    target: &Locator,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();
    loop {
        if !driver.is_visible(target).await? {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(Error::Timeout(format!(
                "{} still visible after {}ms",
                target,
                timeout.as_millis()
            )));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Wait for the page URL to match `pattern`.
pub async fn wait_for_url<D: Driver + ?Sized>(
    driver: &D,
    pattern: &Regex,
    timeout: Duration,
) -> Result<String> {
    let start = Instant::now();
    loop {
        let url = driver.url().await?;
        if pattern.is_match(&url) {
            return Ok(url);
        }
        if start.elapsed() >= timeout {
            return Err(Error::Timeout(format!(
                "URL did not match /{}/ within {}ms (current: {})",
                pattern,
                timeout.as_millis(),
                url
            )));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Wait until the trimmed text of `target` differs from `baseline`.
/// Returns the new text.
pub async fn wait_for_text_change<D: Driver + ?Sized>(
    driver: &D,
    target: &Locator,
    baseline: &str,
    timeout: Duration,
) -> Result<String> {
    let start = Instant::now();
    loop {
        let current = trimmed_text(driver, target).await?;
        if current != baseline {
            return Ok(current);
        }
        if start.elapsed() >= timeout {
            return Err(Error::Timeout(format!(
                "{} text stayed '{}' for {}ms, expected it to change",
                target,
                current,
                timeout.as_millis()
            )));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Trimmed text content, empty when the element is absent.
pub async fn trimmed_text<D: Driver + ?Sized>(driver: &D, target: &Locator) -> Result<String> {
    Ok(driver
        .text(target)
        .await?
        .map(|t| t.trim().to_string())
        .unwrap_or_default())
}

/// Fixed pause for animations and lazy rendering to settle.
pub async fn settle(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}

/// Run a single driver action under a deadline.
pub async fn bounded<T, F>(what: impl std::fmt::Display, timeout: Duration, action: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, action).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "{} did not complete within {}ms",
            what,
            timeout.as_millis()
        ))),
    }
}
