//! # eoka-invite
//!
//! Bulk "invite to follow" selection for company pages. Mounts a button on the
//! page; each click runs a quota-bounded selection pass over the invitee
//! picker, paginating through "Show more results" until the credits are used
//! up or the list runs dry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eoka_invite::{Config, Params, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> eoka_invite::Result<()> {
//! let params = Params::new().set("company", "12345");
//! let config = Config::load_with_params("configs/linkedin.yaml", &params)?;
//! let runner = Runner::new(&config).await?;
//! runner.open().await?;
//! let report = runner.run_once().await;
//! println!("{}", report);
//! runner.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
mod config;
pub mod driver;
mod runner;

pub use adapter::{EntryPoint, Item, LivePage, MountStatus, PageAdapter};
pub use config::{
    BrowserConfig, Config, EntryPointConfig, PageSelectors, ParamDef, Params, TargetUrl,
    Viewport,
};
pub use driver::{Driver, DriverConfig, Outcome, RunReport, SelectionState};
pub use runner::{watch, Runner, WatchOptions, WatchSummary};

/// Result type for eoka-invite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from config loading, the page, or the selection loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("page error: {0}")]
    Adapter(String),

    #[error(
        "integrity mismatch: {selected} invites selected but {credits_used} credits used (planned {planned})"
    )]
    IntegrityMismatch {
        planned: u32,
        selected: u32,
        credits_used: u32,
    },

    #[error("results panel did not appear after {attempts} attempts")]
    PanelMissing { attempts: u32 },
}
