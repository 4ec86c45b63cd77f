//! [`Driver`] over a live eoka page. Locators are resolved in-page by one
//! injected resolver so every call sees the current DOM.

use super::{Driver, Locator, SeedCookie};
use crate::{Error, Result};
use async_trait::async_trait;
use eoka::cdp::{MouseButton, MouseEventType};
use eoka::Page;
use serde::Deserialize;
use tracing::debug;

/// Resolves a JSON step chain (see [`super::Step`]) to an element list.
const RESOLVE_JS: &str = r#"
const __name = (el) => {
    const label = el.getAttribute('aria-label');
    if (label) return label.trim();
    const by = el.getAttribute('aria-labelledby');
    if (by) {
        const t = by.split(/\s+/).map(id => document.getElementById(id)?.textContent || '').join(' ').trim();
        if (t) return t;
    }
    const text = (el.innerText || el.textContent || '').trim();
    if (text) return text;
    return (el.value || '').trim();
};
const __run = (set, steps) => {
    for (const step of steps) {
        if ('query' in step) {
            const out = [];
            for (const root of set) {
                for (const el of root.querySelectorAll(step.query)) {
                    if (!out.includes(el)) out.push(el);
                }
            }
            set = out;
        } else if ('text' in step) {
            const re = new RegExp(step.text, 'i');
            set = set.filter(el => re.test(__name(el)));
        } else if ('has' in step) {
            set = set.filter(el => __run([el], step.has).length > 0);
        } else if ('nth' in step) {
            set = set[step.nth] ? [set[step.nth]] : [];
        } else if ('ancestor' in step) {
            const out = [];
            for (const el of set) {
                const a = el.parentElement ? el.parentElement.closest(step.ancestor) : null;
                if (a && !out.includes(a)) out.push(a);
            }
            set = out;
        }
    }
    return set;
};
const __all = (steps) => __run([document], steps);
const __one = (steps) => __all(steps)[0] || null;
const __visible = (el) => {
    if (!el || !el.isConnected) return false;
    const r = el.getBoundingClientRect();
    const s = getComputedStyle(el);
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
};
"#;

#[derive(Deserialize)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct HitTest {
    found: bool,
    hit: bool,
    blocker: Option<String>,
}

/// A [`Driver`] backed by an eoka [`Page`].
pub struct EokaDriver<'a> {
    page: &'a Page,
}

impl<'a> EokaDriver<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        self.page
    }

    /// Evaluate `body` with `el` bound to the first match of `target`.
    async fn eval_on<T: serde::de::DeserializeOwned>(&self, target: &Locator, body: &str) -> Result<T> {
        let js = format!(
            "(() => {{ {} const el = __one({}); {} }})()",
            RESOLVE_JS,
            target.to_json(),
            body
        );
        Ok(self.page.evaluate(&js).await?)
    }

    /// Like `eval_on` but fails with `ElementMissing` when nothing matches.
    async fn eval_required(&self, target: &Locator, body: &str) -> Result<()> {
        let found: bool = self
            .eval_on(target, &format!("if (!el) return false; {} return true;", body))
            .await?;
        if !found {
            return Err(Error::ElementMissing(target.to_string()));
        }
        Ok(())
    }

    async fn center(&self, target: &Locator) -> Result<Point> {
        let point: Option<Point> = self
            .eval_on(
                target,
                r#"if (!el) return null;
                   el.scrollIntoView({block: 'center', inline: 'center'});
                   const r = el.getBoundingClientRect();
                   if (r.width === 0 || r.height === 0) return null;
                   return {x: r.x + r.width / 2, y: r.y + r.height / 2};"#,
            )
            .await?;
        point.ok_or_else(|| Error::ActionFailed(format!("{} is not rendered", target)))
    }
}

#[async_trait]
impl Driver for EokaDriver<'_> {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("goto {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.page.url().await?)
    }

    async fn set_cookie(&self, cookie: &SeedCookie) -> Result<()> {
        debug!("set_cookie {}={}", cookie.name, cookie.value);
        // The page may still be on about:blank; a domain needs no URL.
        let url = match cookie.domain {
            Some(_) => None,
            None => Some(self.page.url().await?),
        };
        let ok = self
            .page
            .session()
            .set_cookie(
                &cookie.name,
                &cookie.value,
                url.as_deref(),
                cookie.domain.as_deref(),
                cookie.path.as_deref(),
            )
            .await?;
        if !ok {
            return Err(Error::ActionFailed(format!(
                "browser rejected cookie {}",
                cookie.name
            )));
        }
        Ok(())
    }

    async fn is_visible(&self, target: &Locator) -> Result<bool> {
        self.eval_on(target, "return __visible(el);").await
    }

    async fn is_enabled(&self, target: &Locator) -> Result<bool> {
        self.eval_on(
            target,
            "return !!el && !el.disabled && el.getAttribute('aria-disabled') !== 'true';",
        )
        .await
    }

    async fn click(&self, target: &Locator) -> Result<()> {
        let Point { x, y } = self.center(target).await?;
        debug!("click {} at ({:.0}, {:.0})", target, x, y);
        let session = self.page.session();
        session
            .dispatch_mouse_event(MouseEventType::MouseMoved, x, y, None, None)
            .await?;
        session
            .dispatch_mouse_event(MouseEventType::MousePressed, x, y, Some(MouseButton::Left), Some(1))
            .await?;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        session
            .dispatch_mouse_event(MouseEventType::MouseReleased, x, y, Some(MouseButton::Left), Some(1))
            .await?;
        Ok(())
    }

    async fn trial_click(&self, target: &Locator) -> Result<()> {
        let hit: HitTest = self
            .eval_on(
                target,
                r#"if (!el) return {found: false, hit: false, blocker: null};
                   const r = el.getBoundingClientRect();
                   const top = document.elementFromPoint(r.x + r.width / 2, r.y + r.height / 2);
                   const hit = !!top && (top === el || el.contains(top));
                   const blocker = hit || !top ? null : (top.id ? '#' + top.id : top.tagName.toLowerCase() + '.' + top.className);
                   return {found: true, hit, blocker};"#,
            )
            .await?;
        if !hit.found {
            return Err(Error::ElementMissing(target.to_string()));
        }
        if !hit.hit {
            return Err(Error::ActionFailed(format!(
                "{} would not receive the click (covered by {})",
                target,
                hit.blocker.as_deref().unwrap_or("unknown element")
            )));
        }
        Ok(())
    }

    async fn activate(&self, target: &Locator) -> Result<()> {
        debug!("activate {}", target);
        self.eval_required(target, "el.click();").await
    }

    async fn scroll_into_view(&self, target: &Locator) -> Result<()> {
        self.eval_required(target, "el.scrollIntoView({block: 'center', inline: 'nearest'});")
            .await
    }

    async fn fill(&self, target: &Locator, value: &str) -> Result<()> {
        let value = serde_json::to_string(value)?;
        self.eval_required(
            target,
            &format!(
                r#"el.focus();
                   const setter = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value')?.set;
                   if (setter) setter.call(el, {v}); else el.value = {v};
                   el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                   el.dispatchEvent(new Event('change', {{ bubbles: true }}));"#,
                v = value
            ),
        )
        .await
    }

    async fn input_value(&self, target: &Locator) -> Result<String> {
        let value: Option<String> = self
            .eval_on(target, "return el ? String(el.value ?? '') : null;")
            .await?;
        value.ok_or_else(|| Error::ElementMissing(target.to_string()))
    }

    async fn press_key(&self, target: &Locator, key: &str) -> Result<()> {
        self.eval_required(target, "el.focus();").await?;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        self.page.human().press_key(key).await?;
        Ok(())
    }

    async fn text(&self, target: &Locator) -> Result<Option<String>> {
        self.eval_on(target, "return el ? (el.textContent || '') : null;")
            .await
    }

    async fn content(&self) -> Result<String> {
        Ok(self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await?)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(self.page.screenshot().await?)
    }
}
