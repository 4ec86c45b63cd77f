//! Hamburger-menu navigation down to a category page.

use crate::config::{NavigationConfig, SiteSelectors, Timeouts};
use crate::driver::wait::{bounded, settle, wait_for_hidden, wait_for_url, wait_for_visible};
use crate::driver::{Driver, Locator};
use crate::{Error, Result};
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info};

const OPEN_ATTEMPTS: u32 = 3;
/// Wait for the menu after each trigger click.
const OPEN_WAIT: Duration = Duration::from_millis(700);
/// Wait for the URL to change after a navigating click, before falling back.
const NAVIGATE_WAIT: Duration = Duration::from_millis(2500);
/// Slide animation between menu panels.
const PANEL_SETTLE: Duration = Duration::from_millis(300);

/// What a menu item click is expected to do.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Opens a submenu panel; the menu stays visible.
    StayOpen,
    /// Leaves the page; the URL must match and the menu must close.
    Navigate { url_pattern: Regex },
}

/// Department and category to reach through the menu.
#[derive(Debug, Clone)]
pub struct CategoryPath {
    pub department: String,
    pub category: String,
    pub url_pattern: Regex,
    pub landing: String,
}

impl CategoryPath {
    pub fn from_config(config: &NavigationConfig) -> Result<Self> {
        Ok(Self {
            department: config.department.clone(),
            category: config.category.clone(),
            url_pattern: config.url_regex()?,
            landing: config.landing.clone(),
        })
    }
}

/// Drives the hamburger menu. The menu's open state is never cached; it is
/// read from the page before every decision.
pub struct MenuNavigator<'a, D: Driver + ?Sized> {
    driver: &'a D,
    selectors: &'a SiteSelectors,
    timeouts: &'a Timeouts,
}

impl<'a, D: Driver + ?Sized> MenuNavigator<'a, D> {
    pub fn new(driver: &'a D, selectors: &'a SiteSelectors, timeouts: &'a Timeouts) -> Self {
        Self {
            driver,
            selectors,
            timeouts,
        }
    }

    pub async fn is_open(&self) -> Result<bool> {
        self.driver.is_visible(&self.selectors.menu()).await
    }

    /// Open the menu, retrying the trigger click.
    pub async fn open(&self) -> Result<()> {
        let trigger = self.selectors.menu_trigger();
        let menu = self.selectors.menu();

        for attempt in 1..=OPEN_ATTEMPTS {
            if let Err(e) = self.driver.scroll_into_view(&trigger).await {
                debug!("scroll to {} failed: {}", trigger, e);
            }
            if let Err(e) = bounded(&trigger, self.timeouts.action(), self.driver.click(&trigger)).await
            {
                debug!("menu trigger click failed: {}", e);
            }
            match wait_for_visible(self.driver, &menu, OPEN_WAIT).await {
                Ok(()) => {
                    debug!("menu open after {} click(s)", attempt);
                    return Ok(());
                }
                Err(Error::Timeout(_)) => {
                    debug!("menu not open after attempt {}/{}", attempt, OPEN_ATTEMPTS)
                }
                Err(e) => return Err(e),
            }
        }

        wait_for_visible(self.driver, &menu, self.timeouts.expect()).await
    }

    /// Expand the "See all" section of the open menu.
    pub async fn expand_see_all(&self) -> Result<()> {
        let menu = self.selectors.menu();
        wait_for_visible(self.driver, &menu, self.timeouts.expect()).await?;

        let see_all = self.selectors.see_all();
        let clicked = bounded(&see_all, self.timeouts.action(), self.driver.click(&see_all)).await;
        settle(PANEL_SETTLE).await;

        if clicked.is_err() || !self.is_open().await? {
            debug!("see-all click did not stick, activating from script");
            if !self.is_open().await? {
                self.open().await?;
            }
            self.driver.activate(&see_all).await?;
            settle(PANEL_SETTLE).await;
        }

        wait_for_visible(self.driver, &menu, self.timeouts.expect()).await
    }

    /// Click the menu item whose name matches `label`.
    pub async fn click_item(&self, label: &str, transition: Transition) -> Result<()> {
        if !self.is_open().await? {
            self.open().await?;
        }
        let item = self.selectors.menu_item(label);
        wait_for_visible(self.driver, &item, self.timeouts.expect()).await?;

        match transition {
            Transition::StayOpen => self.click_and_stay(&item, label).await,
            Transition::Navigate { url_pattern } => {
                self.click_and_navigate(&item, &url_pattern).await
            }
        }
    }

    async fn click_and_stay(&self, item: &Locator, label: &str) -> Result<()> {
        if let Err(e) = bounded(item, self.timeouts.action(), self.driver.click(item)).await {
            debug!("click on {} failed: {}", item, e);
        }
        settle(PANEL_SETTLE).await;
        if self.is_open().await? {
            return Ok(());
        }

        debug!("menu closed after clicking {}, activating from script", item);
        self.open().await?;
        self.driver.activate(item).await?;
        settle(PANEL_SETTLE).await;
        if self.is_open().await? {
            return Ok(());
        }

        Err(Error::ActionFailed(format!(
            "menu did not stay open after selecting /{}/",
            label
        )))
    }

    async fn click_and_navigate(&self, item: &Locator, url_pattern: &Regex) -> Result<()> {
        if let Err(e) = bounded(item, self.timeouts.action(), self.driver.click(item)).await {
            debug!("click on {} failed: {}", item, e);
        }

        let url = match wait_for_url(self.driver, url_pattern, NAVIGATE_WAIT).await {
            Ok(url) => url,
            Err(Error::Timeout(_)) => {
                debug!("no navigation after clicking {}, activating from script", item);
                self.driver.activate(item).await?;
                wait_for_url(self.driver, url_pattern, self.timeouts.navigation()).await?
            }
            Err(e) => return Err(e),
        };
        debug!("navigated to {}", url);

        wait_for_hidden(self.driver, &self.selectors.menu(), self.timeouts.expect()).await
    }

    /// Walk See all → department → category and confirm the category page
    /// rendered. Returns the category page URL.
    pub async fn go_to_category(&self, path: &CategoryPath) -> Result<String> {
        if !self.is_open().await? {
            self.open().await?;
        }
        self.expand_see_all().await?;
        self.click_item(&path.department, Transition::StayOpen)
            .await?;
        wait_for_visible(self.driver, &self.selectors.menu(), self.timeouts.expect()).await?;

        self.click_item(
            &path.category,
            Transition::Navigate {
                url_pattern: path.url_pattern.clone(),
            },
        )
        .await?;

        let landing = self.selectors.landing(&path.landing);
        wait_for_visible(self.driver, &landing, self.timeouts.expect())
            .await
            .map_err(|_| {
                Error::ElementMissing(format!("category page has no {}", landing))
            })?;

        let url = self.driver.url().await?;
        info!("Reached category page: {}", url);
        Ok(url)
    }
}
