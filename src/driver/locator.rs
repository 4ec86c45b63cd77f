//! Chained element locators, resolved fresh on every driver call.

use serde::Serialize;
use std::fmt;

/// One resolution step. Steps run left to right over a set of elements,
/// starting from the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// `querySelectorAll(css)` under every element in the set.
    Query(String),
    /// Keep elements whose accessible name matches the pattern (case-insensitive).
    Text(String),
    /// Keep elements that contain a match for the nested locator.
    Has(Vec<Step>),
    /// Keep only the n-th element (zero-based).
    Nth(usize),
    /// Replace each element with its nearest proper ancestor matching css.
    Ancestor(String),
}

/// A lazily-resolved reference to page elements.
///
/// Locators never hold element handles: the page re-renders freely, so every
/// `Driver` call resolves the chain again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    /// Locate by CSS selector (comma-separated alternatives allowed).
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            steps: vec![Step::Query(selector.into())],
        }
    }

    /// Descendants of this locator's matches.
    pub fn locate(&self, selector: impl Into<String>) -> Self {
        self.push(Step::Query(selector.into()))
    }

    /// Filter by accessible name (aria-label, labelled-by text, inner text or value).
    pub fn with_text(&self, pattern: impl Into<String>) -> Self {
        self.push(Step::Text(pattern.into()))
    }

    /// Filter to matches that contain `inner`.
    pub fn has(&self, inner: &Locator) -> Self {
        self.push(Step::Has(inner.steps.clone()))
    }

    pub fn nth(&self, index: usize) -> Self {
        self.push(Step::Nth(index))
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// Walk up to the nearest ancestor matching `selector`.
    pub fn ancestor(&self, selector: impl Into<String>) -> Self {
        self.push(Step::Ancestor(selector.into()))
    }

    /// JSON form consumed by the in-page resolver.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "[]".into())
    }

    fn push(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }
}

fn write_steps(f: &mut fmt::Formatter<'_>, steps: &[Step]) -> fmt::Result {
    for (i, step) in steps.iter().enumerate() {
        if i > 0 {
            f.write_str(" >> ")?;
        }
        match step {
            Step::Query(css) => write!(f, "{}", css)?,
            Step::Text(pattern) => write!(f, "text=/{}/i", pattern)?,
            Step::Has(inner) => {
                f.write_str("has=(")?;
                write_steps(f, inner)?;
                f.write_str(")")?;
            }
            Step::Nth(n) => write!(f, "nth={}", n)?,
            Step::Ancestor(css) => write!(f, "ancestor={}", css)?,
        }
    }
    Ok(())
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_steps(f, &self.steps)
    }
}
