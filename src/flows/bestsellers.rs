//! Second item of the "Best Sellers" card on a category page.

use crate::config::{SiteSelectors, Timeouts};
use crate::dom::{self, element_text, first_text, nearest_ancestor};
use crate::driver::wait::{settle, wait_for_visible};
use crate::driver::Driver;
use crate::price::{format_usd, PriceFragments};
use crate::{Error, Result};
use regex::RegexBuilder;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html};
use std::time::Duration;
use tracing::{debug, info};

/// Pause after scrolling the card into view so lazy items render.
const LAZY_SETTLE: Duration = Duration::from_millis(500);

/// Position (1-based) of the priced item whose price is read.
const POSITION: usize = 2;

/// Price of the second priced item in the live page's best-seller card.
pub async fn second_best_seller_price<D: Driver + ?Sized>(
    driver: &D,
    selectors: &SiteSelectors,
    timeouts: &Timeouts,
) -> Result<Decimal> {
    let title = selectors.best_seller_title();
    wait_for_visible(driver, &title, timeouts.expect())
        .await
        .map_err(|e| match e {
            Error::Timeout(_) => Error::ModuleNotFound(format!(
                "no card title matching /{}/ became visible",
                selectors.module_title
            )),
            other => other,
        })?;

    let content = selectors.best_seller_content();
    if let Err(e) = driver.scroll_into_view(&content).await {
        debug!("scroll to {} failed: {}", content, e);
    }
    settle(LAZY_SETTLE).await;

    let html = driver.content().await?;
    let price = extract_second_price(&html, selectors)?;
    info!("Second best seller: {}", format_usd(price));
    Ok(price)
}

/// Read the second priced best-seller item from an HTML snapshot.
///
/// Items without a price element (sponsored tiles, placeholders) are
/// skipped before counting.
pub fn extract_second_price(html: &str, selectors: &SiteSelectors) -> Result<Decimal> {
    let doc = Html::parse_document(html);
    let title_sel = dom::selector(&selectors.card_title)?;
    let card_sel = dom::selector(&selectors.card)?;
    let content_sel = dom::selector(&selectors.card_content)?;
    let item_sel = dom::selector(&selectors.item)?;
    let price_sel = dom::selector(&selectors.price)?;
    let whole_sel = dom::selector(&selectors.price_whole)?;
    let fraction_sel = dom::selector(&selectors.price_fraction)?;
    let module_title = RegexBuilder::new(&selectors.module_title)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::Config(format!("selectors.module_title: {}", e)))?;

    let title = doc
        .select(&title_sel)
        .find(|e| module_title.is_match(&element_text(e)))
        .ok_or_else(|| {
            Error::ModuleNotFound(format!(
                "no {} matching /{}/",
                selectors.card_title, selectors.module_title
            ))
        })?;

    let card = nearest_ancestor(title, |e| card_sel.matches(e)).ok_or_else(|| {
        Error::ModuleNotFound(format!(
            "'{}' is not inside {}",
            element_text(&title),
            selectors.card
        ))
    })?;

    // Content regions can nest (carousel inside content), so dedupe by node.
    let mut priced: Vec<ElementRef> = Vec::new();
    for item in card
        .select(&content_sel)
        .flat_map(|region| region.select(&item_sel))
    {
        if item.select(&price_sel).next().is_none() {
            continue;
        }
        if !priced.iter().any(|p| p.id() == item.id()) {
            priced.push(item);
        }
    }
    debug!("best-seller card has {} priced item(s)", priced.len());

    let Some(item) = priced.get(POSITION - 1) else {
        return Err(Error::TooFewPricedItems {
            found: priced.len(),
        });
    };

    let fragments = PriceFragments::new(
        first_text(item, &whole_sel),
        first_text(item, &fraction_sel),
    );
    match fragments.parse() {
        Some(price) => Ok(price),
        None if fragments.shows_whole() => Err(Error::PriceOutOfRange {
            position: POSITION,
            shown: format!("{}{}", fragments.whole, fragments.fraction),
        }),
        None => Err(Error::PriceMissing { position: POSITION }),
    }
}
