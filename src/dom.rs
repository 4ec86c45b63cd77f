//! Helpers over a parsed HTML snapshot.

use crate::{Error, Result};
use scraper::{ElementRef, Selector};

/// Parse a CSS selector, reporting the offending text on failure.
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Config(format!("invalid selector '{}': {}", css, e)))
}

/// Closest ancestor of `element` (excluding itself) that satisfies `predicate`.
pub fn nearest_ancestor<'a, F>(element: ElementRef<'a>, predicate: F) -> Option<ElementRef<'a>>
where
    F: Fn(&ElementRef<'a>) -> bool,
{
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| predicate(ancestor))
}

/// Text content with whitespace runs collapsed.
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant matching `selector`, empty when absent.
pub fn first_text(element: &ElementRef, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|e| element_text(&e))
        .unwrap_or_default()
}
