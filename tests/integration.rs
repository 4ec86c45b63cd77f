//! Integration tests for eoka-shelf
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test --test integration -- --ignored

use eoka::Browser;
use eoka_shelf::flows::second_best_seller_price;
use eoka_shelf::{Activation, ActivationPath, ClickProtocol, Driver, EokaDriver, Locator};
use eoka_shelf::{Error, SiteSelectors, Timeouts};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Check if Chrome is available
fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_locator_steps() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    page.goto(
        r##"data:text/html,
        <div role="dialog" class="a"><button>Cancel</button></div>
        <div role="dialog" class="b"><span><button aria-label="Continue">Go</button></span></div>
        <button style="display:none">Continue</button>
    "##,
    )
    .await
    .expect("Failed to navigate");

    let driver = EokaDriver::new(&page);

    let buttons = Locator::css("button").with_text("^Continue$");
    assert!(driver.is_visible(&buttons.first()).await.unwrap());
    assert!(!driver.is_visible(&buttons.nth(1)).await.unwrap());
    assert_eq!(driver.text(&buttons.nth(1)).await.unwrap().as_deref(), Some("Continue"));
    assert_eq!(driver.text(&buttons.nth(2)).await.unwrap(), None);

    let dialog = Locator::css(r#"[role="dialog"]"#).has(&buttons);
    assert_eq!(driver.text(&dialog.first()).await.unwrap().as_deref(), Some("Go"));
    assert_eq!(driver.text(&dialog.nth(1)).await.unwrap(), None);

    let up = buttons.first().ancestor(r#"[role="dialog"]"#);
    assert_eq!(driver.text(&up).await.unwrap().as_deref(), Some("Go"));

    let missing = Locator::css("button").with_text("Nope");
    assert!(!driver.is_visible(&missing).await.unwrap());
    assert_eq!(driver.text(&missing).await.unwrap(), None);
    assert!(matches!(
        driver.activate(&missing).await,
        Err(Error::ElementMissing(_))
    ));

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_fill_and_input_value() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    page.goto(
        r##"data:text/html,
        <input id="zip" oninput="document.getElementById('echo').textContent = this.value">
        <p id="echo"></p>
    "##,
    )
    .await
    .expect("Failed to navigate");

    let driver = EokaDriver::new(&page);
    let input = Locator::css("input");

    driver.fill(&input, "10001").await.expect("Failed to fill");
    assert_eq!(driver.input_value(&input).await.unwrap(), "10001");

    // Listeners see the change
    let echo = Locator::css("p");
    assert_eq!(driver.text(&echo).await.unwrap().as_deref(), Some("10001"));

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_trial_click_detects_overlay() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    page.goto(
        r##"data:text/html,
        <button style="margin:40px">Continue</button>
        <div class="glux-desktop-ui-blocker" style="position:fixed;inset:0;background:transparent"></div>
    "##,
    )
    .await
    .expect("Failed to navigate");

    let driver = EokaDriver::new(&page);
    let button = Locator::css("button");

    let err = driver.trial_click(&button).await.unwrap_err();
    assert!(err.to_string().contains("glux-desktop-ui-blocker"), "{}", err);

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_click_protocol_through_blocker() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    // The blocker never goes away; only a programmatic click reaches the button.
    page.goto(
        r##"data:text/html,
        <div role="dialog" style="padding:40px">
          <button onclick="this.closest('[role=dialog]').style.display='none'">Continue</button>
        </div>
        <div class="glux-desktop-ui-blocker" style="position:fixed;inset:0"></div>
    "##,
    )
    .await
    .expect("Failed to navigate");

    let driver = EokaDriver::new(&page);
    let button = Locator::css("button").with_text("^Continue$").first();
    let dialog = Locator::css(r#"[role="dialog"]"#).first();

    let result = ClickProtocol::default()
        .activate_and_confirm_closed(&driver, &button, &dialog)
        .await
        .expect("Dialog should close");

    assert_eq!(
        result,
        Activation::Closed {
            attempt: 1,
            via: ActivationPath::Programmatic
        }
    );

    // Idempotent once closed
    let again = ClickProtocol::default()
        .activate_and_confirm_closed(&driver, &button, &dialog)
        .await
        .unwrap();
    assert_eq!(again, Activation::AlreadyClosed);

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_second_best_seller_price() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    page.goto(
        r##"data:text/html,
        <div class="octopus-pc-card">
          <div class="octopus-pc-card-title"><h2><span>Best Sellers in TV &amp; Video</span></h2></div>
          <div class="octopus-pc-card-content"><ul>
            <li><span class="a-price"><span class="a-price-whole">89<span>.</span></span><span class="a-price-fraction">99</span></span></li>
            <li><span>Sponsored</span></li>
            <li><span class="a-price"><span class="a-price-whole">1,142<span>.</span></span><span class="a-price-fraction">5</span></span></li>
          </ul></div>
        </div>
    "##,
    )
    .await
    .expect("Failed to navigate");

    let driver = EokaDriver::new(&page);
    let price = second_best_seller_price(&driver, &SiteSelectors::default(), &Timeouts::default())
        .await
        .expect("Failed to extract price");

    assert_eq!(price, Decimal::from_str("1142.05").unwrap());

    browser.close().await.expect("Failed to close browser");
}
