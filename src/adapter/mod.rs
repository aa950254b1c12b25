//! The boundary between the selection driver and the host page.
//!
//! The driver never touches the DOM. Everything it needs goes through
//! [`PageAdapter`], which makes it drivable by a scripted fake in tests and
//! by [`LivePage`] against a real browser.

mod page;
mod quota;

pub use page::LivePage;
pub use quota::parse_quota;

use crate::Result;
use serde::Deserialize;
use std::fmt;

/// Opaque handle to one checkbox in the results panel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Item {
    /// Stable for the life of the DOM node.
    pub id: u64,
    pub selected: bool,
    pub disabled: bool,
    pub visible: bool,
}

impl Item {
    /// Not yet chosen, not disabled and currently rendered.
    pub fn is_eligible(&self) -> bool {
        !self.selected && !self.disabled && self.visible
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.id)?;
        if self.selected {
            f.write_str(" [selected]")?;
        }
        if self.disabled {
            f.write_str(" [disabled]")?;
        }
        if !self.visible {
            f.write_str(" [hidden]")?;
        }
        Ok(())
    }
}

/// Capabilities the driver consumes. Every call reflects live page state.
#[allow(async_fn_in_trait)]
pub trait PageAdapter {
    /// Remaining credits, or `None` if the counter is absent or unparseable.
    async fn read_quota(&self) -> Result<Option<u32>>;

    /// Whether the results panel has been rendered yet.
    async fn has_results_panel(&self) -> Result<bool>;

    /// Candidate items in panel order. The driver filters with
    /// [`Item::is_eligible`].
    async fn list_selectable_items(&self) -> Result<Vec<Item>>;

    /// Select one item; returns whether the page now shows it as selected.
    async fn select(&self, item: &Item) -> Result<bool>;

    /// Scroll the panel to its bottom so lazy rows render.
    async fn request_scroll(&self) -> Result<()>;

    async fn has_more_results_control(&self) -> Result<bool>;

    async fn activate_more_results_control(&self) -> Result<()>;
}

/// Result of one mount attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    Installed,
    AlreadyMounted,
    /// The element the button attaches to is not on the page yet.
    AnchorMissing,
}

/// The on-page control that triggers a run.
#[allow(async_fn_in_trait)]
pub trait EntryPoint {
    /// Install the control unless it already exists. Safe to call any
    /// number of times.
    async fn mount_entry_point(&self) -> Result<MountStatus>;

    /// Clicks recorded since the previous call.
    async fn take_activations(&self) -> Result<u32>;
}
