//! [`PageAdapter`] and [`EntryPoint`] over a live `eoka::Page`.

use super::{parse_quota, EntryPoint, Item, MountStatus, PageAdapter};
use crate::config::{EntryPointConfig, PageSelectors};
use crate::{Error, Result};
use eoka::Page;
use serde_json::json;
use tracing::debug;

/// Text of the first `<span>` mentioning the credits keyword.
const CREDITS_TEXT_JS: &str = r#"
(() => {
    const re = new RegExp(arg.keyword, 'i');
    const el = [...document.querySelectorAll('span')].find(s => re.test(s.textContent || ''));
    return el ? el.textContent : null;
})()
"#;

const PANEL_PRESENT_JS: &str = r#"!!document.querySelector(arg.container)"#;

/// Tags every checkbox with a stable id and reports its state.
const LIST_ITEMS_JS: &str = r#"
(() => {
    const container = document.querySelector(arg.container);
    if (!container) return '[]';
    window.__eokaInviteSeq = window.__eokaInviteSeq || 0;
    const items = [];
    for (const cb of container.querySelectorAll(arg.checkbox)) {
        if (!cb.dataset.eokaInviteId) cb.dataset.eokaInviteId = String(++window.__eokaInviteSeq);
        items.push({
            id: Number(cb.dataset.eokaInviteId),
            selected: !!cb.checked,
            disabled: !!cb.disabled,
            visible: cb.offsetParent !== null,
        });
    }
    return JSON.stringify(items);
})()
"#;

const SELECT_JS: &str = r#"
(() => {
    const cb = document.querySelector('[data-eoka-invite-id="' + arg.id + '"]');
    if (!cb) return false;
    if (!cb.checked) cb.click();
    return !!cb.checked;
})()
"#;

const SCROLL_JS: &str = r#"
(() => {
    const container = document.querySelector(arg.container);
    if (container) container.scrollTop = container.scrollHeight;
})()
"#;

/// Finds the "show more" button next to the panel; clicks it when `arg.click`.
const SHOW_MORE_JS: &str = r#"
(() => {
    const container = document.querySelector(arg.container);
    const scope = container?.parentElement;
    if (!scope) return false;
    const btn = [...scope.querySelectorAll('button')]
        .find(b => (b.textContent || '').trim().toLowerCase() === arg.label);
    if (!btn) return false;
    if (arg.click) btn.click();
    return true;
})()
"#;

const MOUNT_JS: &str = r#"
(() => {
    if (document.getElementById(arg.id)) return 'mounted';
    const re = new RegExp(arg.keyword, 'i');
    const anchor = [...document.querySelectorAll('span')].find(s => re.test(s.textContent || ''));
    const parent = anchor?.closest('div');
    if (!parent) return 'no_anchor';
    const btn = document.createElement('button');
    btn.id = arg.id;
    btn.type = 'button';
    btn.innerText = arg.label;
    Object.assign(btn.style, {
        padding: '6px 12px',
        fontWeight: 'bold',
        backgroundColor: '#0073b1',
        color: 'white',
        border: 'none',
        borderRadius: '4px',
        cursor: 'pointer'
    });
    btn.addEventListener('click', () => {
        window.__eokaInviteActivations = (window.__eokaInviteActivations || 0) + 1;
    });
    parent.appendChild(btn);
    return 'installed';
})()
"#;

const TAKE_ACTIVATIONS_JS: &str = r#"
(() => {
    const n = window.__eokaInviteActivations || 0;
    window.__eokaInviteActivations = 0;
    return n;
})()
"#;

/// The host page as seen through an `eoka::Page`.
pub struct LivePage {
    page: Page,
    selectors: PageSelectors,
    entry_point: EntryPointConfig,
}

impl LivePage {
    pub fn new(page: Page, selectors: PageSelectors, entry_point: EntryPointConfig) -> Self {
        Self {
            page,
            selectors,
            entry_point,
        }
    }

    /// Get a reference to the underlying page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Bind `arg` for a script body.
    fn script(body: &str, arg: serde_json::Value) -> String {
        format!("(() => {{ const arg = {}; return {}; }})()", arg, body.trim())
    }

    fn keyword_pattern(&self) -> String {
        regex::escape(self.selectors.credits_keyword.trim())
    }

    async fn show_more(&self, click: bool) -> Result<bool> {
        let js = Self::script(
            SHOW_MORE_JS,
            json!({
                "container": self.selectors.results_container,
                "label": self.selectors.show_more_label.trim().to_lowercase(),
                "click": click,
            }),
        );
        Ok(self.page.evaluate(&js).await?)
    }
}

impl PageAdapter for LivePage {
    async fn read_quota(&self) -> Result<Option<u32>> {
        let js = Self::script(CREDITS_TEXT_JS, json!({ "keyword": self.keyword_pattern() }));
        let text: Option<String> = self.page.evaluate(&js).await?;
        debug!("credits text: {:?}", text);
        Ok(text.as_deref().and_then(parse_quota))
    }

    async fn has_results_panel(&self) -> Result<bool> {
        let js = Self::script(
            PANEL_PRESENT_JS,
            json!({ "container": self.selectors.results_container }),
        );
        Ok(self.page.evaluate(&js).await?)
    }

    async fn list_selectable_items(&self) -> Result<Vec<Item>> {
        let js = Self::script(
            LIST_ITEMS_JS,
            json!({
                "container": self.selectors.results_container,
                "checkbox": self.selectors.checkbox,
            }),
        );
        let json_str: String = self.page.evaluate(&js).await?;
        serde_json::from_str(&json_str)
            .map_err(|e| Error::Adapter(format!("item list parse error: {}", e)))
    }

    async fn select(&self, item: &Item) -> Result<bool> {
        let js = Self::script(SELECT_JS, json!({ "id": item.id }));
        Ok(self.page.evaluate(&js).await?)
    }

    async fn request_scroll(&self) -> Result<()> {
        let js = Self::script(
            SCROLL_JS,
            json!({ "container": self.selectors.results_container }),
        );
        self.page.execute(&js).await?;
        Ok(())
    }

    async fn has_more_results_control(&self) -> Result<bool> {
        self.show_more(false).await
    }

    async fn activate_more_results_control(&self) -> Result<()> {
        if self.show_more(true).await? {
            Ok(())
        } else {
            Err(Error::Adapter(format!(
                "'{}' control disappeared before it could be clicked",
                self.selectors.show_more_label
            )))
        }
    }
}

impl EntryPoint for LivePage {
    async fn mount_entry_point(&self) -> Result<MountStatus> {
        let js = Self::script(
            MOUNT_JS,
            json!({
                "id": self.entry_point.id,
                "label": self.entry_point.label,
                "keyword": self.keyword_pattern(),
            }),
        );
        let status: String = self.page.evaluate(&js).await?;
        match status.as_str() {
            "installed" => Ok(MountStatus::Installed),
            "mounted" => Ok(MountStatus::AlreadyMounted),
            "no_anchor" => Ok(MountStatus::AnchorMissing),
            other => Err(Error::Adapter(format!("unexpected mount status: {}", other))),
        }
    }

    async fn take_activations(&self) -> Result<u32> {
        Ok(self.page.evaluate(TAKE_ACTIVATIONS_JS).await?)
    }
}
