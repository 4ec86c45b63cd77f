//! Overlay-aware clicking for dialogs that must close after a button press.
//!
//! The location popover on the storefront is covered by a transparent
//! blocker while it re-renders, so a plain pointer click is frequently
//! swallowed. [`ClickProtocol`] escalates from a pointer click to a
//! programmatic `element.click()` and judges success only by the dialog
//! actually closing.

use crate::config::{ClickConfig, SiteSelectors};
use crate::driver::wait::{wait_for_hidden, wait_for_visible};
use crate::driver::{Driver, Locator};
use crate::{Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How the successful activation reached the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPath {
    /// Real pointer click at the element's center.
    Pointer,
    /// `element.click()` from script.
    Programmatic,
}

/// Outcome of [`ClickProtocol::activate_and_confirm_closed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The dialog was already gone; nothing was clicked.
    AlreadyClosed,
    Closed { attempt: u32, via: ActivationPath },
}

#[derive(Debug, Clone)]
pub struct ClickProtocol {
    pub max_attempts: u32,
    pub blocker: Locator,
    pub button_visible: Duration,
    pub overlay_grace: Duration,
    pub close_poll: Duration,
}

impl Default for ClickProtocol {
    fn default() -> Self {
        Self::from_config(&ClickConfig::default(), &SiteSelectors::default())
    }
}

impl ClickProtocol {
    pub fn from_config(config: &ClickConfig, selectors: &SiteSelectors) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            blocker: selectors.blocker(),
            button_visible: Duration::from_millis(config.button_visible_ms),
            overlay_grace: Duration::from_millis(config.overlay_grace_ms),
            close_poll: Duration::from_millis(config.close_poll_ms),
        }
    }

    /// Press `button` until `close_signal` is hidden, at most `max_attempts`
    /// times.
    ///
    /// A failed attempt (button never visible, disabled, click swallowed) is
    /// logged and the next attempt starts. Errors with
    /// [`Error::OverlayPersistent`] once every attempt is used up.
    pub async fn activate_and_confirm_closed<D: Driver + ?Sized>(
        &self,
        driver: &D,
        button: &Locator,
        close_signal: &Locator,
    ) -> Result<Activation> {
        if !driver.is_visible(close_signal).await? {
            debug!("{} already closed, skipping click", close_signal);
            return Ok(Activation::AlreadyClosed);
        }

        for attempt in 1..=self.max_attempts {
            match self.attempt(driver, button, close_signal).await {
                Ok(Some(via)) => {
                    info!("Dialog closed on attempt {} ({:?})", attempt, via);
                    return Ok(Activation::Closed { attempt, via });
                }
                Ok(None) => warn!(
                    "Attempt {}/{}: {} still open",
                    attempt, self.max_attempts, close_signal
                ),
                Err(e) => warn!("Attempt {}/{} failed: {}", attempt, self.max_attempts, e),
            }
        }

        Err(Error::OverlayPersistent {
            attempts: self.max_attempts,
        })
    }

    async fn attempt<D: Driver + ?Sized>(
        &self,
        driver: &D,
        button: &Locator,
        close_signal: &Locator,
    ) -> Result<Option<ActivationPath>> {
        wait_for_visible(driver, button, self.button_visible).await?;
        driver.scroll_into_view(button).await?;
        if !driver.is_visible(button).await? || !driver.is_enabled(button).await? {
            return Err(Error::ActionFailed(format!(
                "{} is not visible and enabled",
                button
            )));
        }

        let blocked = driver.is_visible(&self.blocker).await?
            && !self.hidden_within(driver, &self.blocker, self.overlay_grace).await?;

        let via = if blocked {
            debug!("{} still covers the page, activating from script", self.blocker);
            if let Err(e) = driver.activate(button).await {
                debug!("activation of {} failed: {}", button, e);
            }
            ActivationPath::Programmatic
        } else {
            if let Err(e) = driver.trial_click(button).await {
                debug!("trial click on {} failed: {}", button, e);
            }
            if let Err(e) = driver.click(button).await {
                debug!("click on {} failed: {}", button, e);
            }
            ActivationPath::Pointer
        };

        if self.hidden_within(driver, close_signal, self.close_poll).await? {
            return Ok(Some(via));
        }

        debug!("{} did not close, retrying from script", close_signal);
        if let Err(e) = driver.activate(button).await {
            debug!("activation of {} failed: {}", button, e);
        }
        if self.hidden_within(driver, close_signal, self.close_poll).await? {
            return Ok(Some(ActivationPath::Programmatic));
        }

        Ok(None)
    }

    /// `true` if `target` hid within `window`. Driver errors propagate.
    async fn hidden_within<D: Driver + ?Sized>(
        &self,
        driver: &D,
        target: &Locator,
        window: Duration,
    ) -> Result<bool> {
        match wait_for_hidden(driver, target, window).await {
            Ok(()) => Ok(true),
            Err(Error::Timeout(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
