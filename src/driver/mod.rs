//! Page abstraction consumed by the flows.
//!
//! Flows only ever talk to a [`Driver`]. [`EokaDriver`] implements it over a
//! live eoka page; tests implement it with a scripted in-memory page.

mod locator;
mod page;
pub mod wait;

pub use locator::{Locator, Step};
pub use page::EokaDriver;

use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// A cookie injected before the first navigation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
}

/// Element lookup, state queries and actions against one page session.
///
/// Every method resolves its locator at call time. State queries treat a
/// missing element as "not visible" rather than an error.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate and wait for the load to finish.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Current URL.
    async fn url(&self) -> Result<String>;

    async fn set_cookie(&self, cookie: &SeedCookie) -> Result<()>;

    /// Rendered with a non-empty box and not `visibility: hidden`.
    async fn is_visible(&self, target: &Locator) -> Result<bool>;

    /// Present and not disabled.
    async fn is_enabled(&self, target: &Locator) -> Result<bool>;

    /// Pointer click at the element's center.
    async fn click(&self, target: &Locator) -> Result<()>;

    /// Hit-test the element's center without dispatching any event. Errors if
    /// another element (an overlay) would receive the click.
    async fn trial_click(&self, target: &Locator) -> Result<()>;

    /// Programmatic activation (`element.click()`), bypassing pointer hit-testing.
    async fn activate(&self, target: &Locator) -> Result<()>;

    async fn scroll_into_view(&self, target: &Locator) -> Result<()>;

    /// Replace the value of an input.
    async fn fill(&self, target: &Locator, value: &str) -> Result<()>;

    async fn input_value(&self, target: &Locator) -> Result<String>;

    /// Focus the element and press a key (e.g. "Enter").
    async fn press_key(&self, target: &Locator, key: &str) -> Result<()>;

    /// Text content of the element, `None` if it does not exist.
    async fn text(&self, target: &Locator) -> Result<Option<String>>;

    /// Full document HTML.
    async fn content(&self) -> Result<String>;

    /// PNG screenshot of the viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}
