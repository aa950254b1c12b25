mod watcher;

pub use watcher::{watch, WatchOptions, WatchSummary};

use crate::adapter::LivePage;
use crate::config::Config;
use crate::driver::{Driver, RunReport};
use crate::Result;
use eoka::Browser;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;
use tracing::{debug, info};

/// Owns the browser and the driver bound to its page.
pub struct Runner {
    browser: Browser,
    driver: Rc<Driver<LivePage>>,
    target_url: String,
    interval: Duration,
}

impl Runner {
    /// Launch a browser and bind a driver to a fresh page.
    pub async fn new(config: &Config) -> Result<Self> {
        let stealth = config.browser.stealth();

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.browser.headless, config.browser.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;
        let adapter = LivePage::new(page, config.page.clone(), config.entry_point.clone());

        Ok(Self {
            browser,
            driver: Rc::new(Driver::new(adapter, config.driver.clone())),
            target_url: config.target.url.clone(),
            interval: Duration::from_millis(config.entry_point.interval_ms),
        })
    }

    pub fn driver(&self) -> &Driver<LivePage> {
        &self.driver
    }

    /// Navigate to the configured target.
    pub async fn open(&self) -> Result<()> {
        info!("Navigating to: {}", self.target_url);
        self.driver.adapter().page().goto(&self.target_url).await?;
        Ok(())
    }

    /// One selection pass, without the on-page button.
    pub async fn run_once(&self) -> RunReport {
        self.driver.start().await
    }

    /// Watch options with the configured mount interval.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions::new(self.interval)
    }

    /// Serve on-page activations until `options` says stop or Ctrl-C.
    pub async fn watch(&self, options: WatchOptions) -> Result<WatchSummary> {
        LocalSet::new()
            .run_until(watch(Rc::clone(&self.driver), options))
            .await
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
