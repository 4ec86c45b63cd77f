//! CSS selectors and name patterns for the storefront markup.
//!
//! Defaults match the Amazon US desktop layout. Any field can be overridden
//! under `selectors:` in the scenario file when the markup shifts. Patterns
//! are regular expressions matched case-insensitively against an element's
//! accessible name.

use crate::driver::Locator;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    // Header / location
    pub location_link: String,
    pub logo: String,
    pub location_header: String,
    pub location_popover: String,
    pub zip_input: String,
    pub blocker: String,

    // Generic roles
    pub dialog: String,
    pub button: String,
    pub link: String,
    pub heading: String,
    pub continue_label: String,
    pub dismiss_label: String,

    // Hamburger menu
    pub menu_trigger: String,
    pub menu_root: String,
    pub menu_item: String,
    pub see_all_label: String,

    // Best sellers card
    pub card_title: String,
    pub card: String,
    pub card_content: String,
    pub module_title: String,
    pub item: String,
    pub price: String,
    pub price_whole: String,
    pub price_fraction: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            location_link: "#nav-global-location-popover-link".into(),
            logo: "a#nav-logo-sprites, a.nav-logo-link, #nav-logo-sprites".into(),
            location_header: "#glow-ingress-line2".into(),
            location_popover: r#"[aria-label="Choose your location"]"#.into(),
            zip_input: "#GLUXZipUpdateInput, #GLUXPostalCode".into(),
            blocker: ".glux-desktop-ui-blocker".into(),

            dialog: r#"[role="dialog"]"#.into(),
            button: r#"button, input[type="submit"], input[type="button"], [role="button"]"#
                .into(),
            link: r#"a[href], [role="link"]"#.into(),
            heading: r#"h1, h2, h3, [role="heading"]"#.into(),
            continue_label: "^Continue$".into(),
            dismiss_label: "Dismiss|Close".into(),

            menu_trigger: "#nav-hamburger-menu".into(),
            menu_root: "#hmenu-content".into(),
            menu_item: "a.hmenu-item".into(),
            see_all_label: r"See\s*all".into(),

            card_title: ".octopus-pc-card-title span".into(),
            card: ".octopus-pc-card".into(),
            card_content:
                ".octopus-pc-card-content, .octopus-card-content, .octopus-card-carousel-container"
                    .into(),
            module_title: r"best\s*sellers".into(),
            item: "li".into(),
            price: ".a-price".into(),
            price_whole: ".a-price .a-price-whole".into(),
            price_fraction: ".a-price .a-price-fraction".into(),
        }
    }
}

impl SiteSelectors {
    /// Name patterns that must compile, with their config key.
    pub(crate) fn patterns(&self) -> [(&'static str, &str); 4] {
        [
            ("selectors.continue_label", &self.continue_label),
            ("selectors.dismiss_label", &self.dismiss_label),
            ("selectors.see_all_label", &self.see_all_label),
            ("selectors.module_title", &self.module_title),
        ]
    }

    pub fn location_link(&self) -> Locator {
        Locator::css(&self.location_link)
    }

    pub fn logo(&self) -> Locator {
        Locator::css(&self.logo).first()
    }

    pub fn location_header(&self) -> Locator {
        Locator::css(&self.location_header)
    }

    pub fn location_popover(&self) -> Locator {
        Locator::css(&self.location_popover).first()
    }

    pub fn zip_input(&self) -> Locator {
        self.location_popover().locate(&self.zip_input).first()
    }

    pub fn blocker(&self) -> Locator {
        Locator::css(&self.blocker)
    }

    fn continue_any(&self) -> Locator {
        Locator::css(&self.button).with_text(&self.continue_label)
    }

    pub fn continue_button(&self) -> Locator {
        self.continue_any().first()
    }

    /// The dialog that hosts the Continue button; closes once the ZIP applies.
    pub fn confirm_dialog(&self) -> Locator {
        Locator::css(&self.dialog).has(&self.continue_any()).first()
    }

    pub fn dismiss_button(&self) -> Locator {
        Locator::css(&self.button)
            .with_text(&self.dismiss_label)
            .first()
    }

    pub fn menu_trigger(&self) -> Locator {
        Locator::css(&self.menu_trigger)
    }

    /// Menu content container; visible exactly while the menu is open.
    pub fn menu(&self) -> Locator {
        Locator::css(&self.dialog).locate(&self.menu_root).first()
    }

    pub fn menu_item(&self, label: &str) -> Locator {
        Locator::css(format!("{} {}", self.menu_root, self.menu_item))
            .with_text(label)
            .first()
    }

    pub fn see_all(&self) -> Locator {
        self.menu()
            .locate(&self.link)
            .with_text(&self.see_all_label)
            .first()
    }

    /// Link or heading on the destination page that proves arrival.
    pub fn landing(&self, pattern: &str) -> Locator {
        Locator::css(format!("{}, {}", self.link, self.heading))
            .with_text(pattern)
            .first()
    }

    pub fn best_seller_title(&self) -> Locator {
        Locator::css(&self.card_title)
            .with_text(&self.module_title)
            .first()
    }

    pub fn best_seller_content(&self) -> Locator {
        self.best_seller_title()
            .ancestor(&self.card)
            .locate(&self.card_content)
            .first()
    }
}
