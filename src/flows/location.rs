//! Delivery ZIP through the storefront's "Deliver to" popover.

use crate::click::ClickProtocol;
use crate::config::{LocationConfig, SiteSelectors, Timeouts};
use crate::driver::wait::{
    bounded, settle, trimmed_text, wait_for_any_visible, wait_for_text_change, wait_for_visible,
};
use crate::driver::Driver;
use crate::{Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Header text before and after a ZIP change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    pub before: String,
    pub after: String,
}

/// Pause after dismissing the residual location banner.
const DISMISS_PAUSE: Duration = Duration::from_millis(200);

/// Apply a delivery ZIP through the "Deliver to" popover.
///
/// Success is judged by the header text changing, not by the popover
/// closing: the site sometimes closes the dialog without applying the ZIP.
pub async fn set_delivery_zip<D: Driver + ?Sized>(
    driver: &D,
    selectors: &SiteSelectors,
    timeouts: &Timeouts,
    protocol: &ClickProtocol,
    location: &LocationConfig,
) -> Result<LocationChange> {
    let zip = location.zip.as_str();
    let link = selectors.location_link();

    if !driver.is_visible(&link).await? {
        warn!("Location link not visible, returning to the home page via the logo");
        let logo = selectors.logo();
        if let Err(e) = bounded(&logo, timeouts.action(), driver.click(&logo)).await {
            debug!("logo click failed: {}", e);
        }
        wait_for_visible(driver, &link, timeouts.expect())
            .await
            .map_err(|_| Error::ElementMissing(format!("{} (after logo recovery)", link)))?;
    }

    let header = selectors.location_header();
    let before = trimmed_text(driver, &header).await?;
    debug!("location header before: '{}'", before);

    bounded(&link, timeouts.action(), driver.click(&link)).await?;
    wait_for_visible(driver, &selectors.location_popover(), timeouts.expect()).await?;

    let input = selectors.zip_input();
    bounded(&input, timeouts.action(), driver.fill(&input, zip)).await?;
    let value = driver.input_value(&input).await?;
    if value != zip {
        return Err(Error::ActionFailed(format!(
            "{} holds '{}' after fill, expected '{}'",
            input, value, zip
        )));
    }
    settle(location.settle()).await;

    if let Err(e) = bounded(&input, timeouts.action(), driver.press_key(&input, "Enter")).await {
        warn!("Enter on ZIP input failed, continuing: {}", e);
    }

    // Enter may apply the ZIP on its own, or the dialog may still be rendering.
    let button = selectors.continue_button();
    let dialog = selectors.confirm_dialog();
    let targets = [button.clone(), dialog.clone()];
    match wait_for_any_visible(driver, &targets, protocol.button_visible).await {
        Ok(_) => {
            let activation = protocol
                .activate_and_confirm_closed(driver, &button, &dialog)
                .await?;
            debug!("location dialog: {:?}", activation);
        }
        Err(Error::Timeout(msg)) => {
            if trimmed_text(driver, &header).await? == before {
                return Err(Error::Timeout(msg));
            }
            debug!("{} never showed and the header already changed", dialog);
        }
        Err(e) => return Err(e),
    }

    let after =
        wait_for_text_change(driver, &header, &before, timeouts.location_update()).await?;
    info!("Delivery location: '{}' -> '{}'", before, after);

    dismiss_banner(driver, selectors, timeouts).await;

    Ok(LocationChange { before, after })
}

/// Close a leftover "Dismiss"/"Close" banner if one is showing. Best effort.
async fn dismiss_banner<D: Driver + ?Sized>(
    driver: &D,
    selectors: &SiteSelectors,
    timeouts: &Timeouts,
) {
    let button = selectors.dismiss_button();
    if !driver.is_visible(&button).await.unwrap_or(false) {
        return;
    }
    match bounded(&button, timeouts.action(), driver.click(&button)).await {
        Ok(()) => settle(DISMISS_PAUSE).await,
        Err(e) => debug!("dismiss click failed: {}", e),
    }
}
