//! Split price parsing.
//!
//! Storefronts render a price as separate "whole" and "fraction" elements
//! (`<span class="a-price-whole">1,234<span>.</span></span>
//! <span class="a-price-fraction">5</span>`). Only digits survive parsing, so
//! thousands separators, currency symbols and the decimal-point span are never
//! mistaken for a decimal point.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Raw text of the two price fragments, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceFragments {
    /// Integer part as displayed (e.g. "1,234.").
    pub whole: String,
    /// Fractional part as displayed (e.g. "99").
    pub fraction: String,
}

impl PriceFragments {
    pub fn new(whole: impl Into<String>, fraction: impl Into<String>) -> Self {
        Self {
            whole: whole.into(),
            fraction: fraction.into(),
        }
    }

    /// Parse into an exact two-decimal amount. `None` when no whole part is
    /// shown or the amount does not fit a `Decimal`.
    pub fn parse(&self) -> Option<Decimal> {
        parse_price(&self.whole, &self.fraction)
    }

    /// Whether the whole part shows any digits at all.
    pub fn shows_whole(&self) -> bool {
        self.whole.chars().any(|c| c.is_ascii_digit())
    }
}

/// Parse a split price into a decimal with exactly two fractional digits.
///
/// Returns `None` when the whole part contains no digits (price hidden, out of
/// stock) or has more digits than a `Decimal` holds; use
/// [`PriceFragments::shows_whole`] to tell the two apart. A missing fraction
/// counts as `00`, a single digit is left-padded (`"5"` → `05`) and longer
/// fractions are truncated, never rounded.
pub fn parse_price(whole: &str, fraction: &str) -> Option<Decimal> {
    let whole = digits(whole);
    if whole.is_empty() {
        return None;
    }

    let mut fraction = digits(fraction);
    fraction.truncate(2);
    let fraction = format!("{:0>2}", fraction);

    // Out-of-range whole parts (more than 28 digits) fail here too.
    Decimal::from_str(&format!("{}.{}", whole, fraction)).ok()
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Format an amount the way the storefront annotates it (`$142.50`).
pub fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", amount)
}
