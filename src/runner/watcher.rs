use crate::adapter::{EntryPoint, MountStatus, PageAdapter};
use crate::driver::{Driver, Outcome, RunReport};
use crate::Result;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// When the watcher stops.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Mount/poll period.
    pub interval: Duration,
    /// Stop once the first real run (not a duplicate) has finished.
    pub once: bool,
    /// Stop ticking after this many ticks, then wait for in-flight runs.
    pub max_ticks: Option<u32>,
}

impl WatchOptions {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            once: false,
            max_ticks: None,
        }
    }
}

/// What happened while watching.
#[derive(Debug, Default)]
pub struct WatchSummary {
    pub ticks: u32,
    /// Times the entry point was actually installed.
    pub installs: u32,
    pub reports: Vec<RunReport>,
}

impl WatchSummary {
    /// The last run that was not a duplicate.
    pub fn last_run(&self) -> Option<&RunReport> {
        self.reports
            .iter()
            .rev()
            .find(|r| !matches!(r.outcome, Outcome::DuplicateStart))
    }
}

/// Keep the entry point mounted and start a run for every activation.
///
/// Must be polled inside a [`tokio::task::LocalSet`]: runs are spawned with
/// `spawn_local` so they share the driver, and its `running` flag, with this
/// loop on one thread. Activations during an active run come back as
/// [`Outcome::DuplicateStart`].
pub async fn watch<A>(driver: Rc<Driver<A>>, options: WatchOptions) -> Result<WatchSummary>
where
    A: PageAdapter + EntryPoint + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<RunReport>();
    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut summary = WatchSummary::default();
    let mut in_flight = 0usize;
    let mut ticking = true;

    loop {
        tokio::select! {
            _ = ticker.tick(), if ticking => {
                summary.ticks += 1;
                match driver.adapter().mount_entry_point().await {
                    Ok(MountStatus::Installed) => {
                        summary.installs += 1;
                        info!("Entry point mounted.");
                    }
                    Ok(MountStatus::AlreadyMounted) => {}
                    Ok(MountStatus::AnchorMissing) => debug!("Credits counter not on page yet"),
                    Err(e) => warn!("Failed to mount entry point: {}", e),
                }

                let clicks = driver.adapter().take_activations().await.unwrap_or_else(|e| {
                    warn!("Failed to read activations: {}", e);
                    0
                });
                for _ in 0..clicks {
                    let driver = Rc::clone(&driver);
                    let tx = tx.clone();
                    in_flight += 1;
                    tokio::task::spawn_local(async move {
                        let _ = tx.send(driver.start().await);
                    });
                }

                if options.max_ticks.is_some_and(|max| summary.ticks >= max) {
                    ticking = false;
                    if in_flight == 0 {
                        break;
                    }
                }
            }
            Some(report) = rx.recv() => {
                in_flight -= 1;
                let finished = !matches!(report.outcome, Outcome::DuplicateStart);
                summary.reports.push(report);
                if in_flight == 0 && (!ticking || (options.once && finished)) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watcher");
                break;
            }
        }
    }

    Ok(summary)
}
