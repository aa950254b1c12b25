//! The selection loop.
//!
//! One [`Driver::start`] reads the quota once, then alternates between
//! selecting eligible items and paginating until the quota is met, the page
//! runs dry, or something fails. At most one run is active per driver.

mod state;

pub use state::{RunGuard, SelectionState};

use crate::adapter::PageAdapter;
use crate::{Error, Result};
use serde::Deserialize;
use std::cell::Cell;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Delays and ceilings for the selection loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Wait between checks while the results panel is not rendered yet.
    pub settle_delay_ms: u64,
    /// Wait after each selected batch (host debounce/animation).
    pub batch_delay_ms: u64,
    /// Wait after scrolling the panel to its bottom.
    pub scroll_delay_ms: u64,
    /// Wait after clicking "show more".
    pub pagination_delay_ms: u64,
    /// Consecutive idle iterations before giving up.
    pub idle_ceiling: u32,
    /// Consecutive missing-panel checks before aborting.
    pub max_settle_attempts: u32,
    /// Consecutive pagination clicks without a selection before giving up.
    pub pagination_ceiling: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            batch_delay_ms: 1200,
            scroll_delay_ms: 600,
            pagination_delay_ms: 1200,
            idle_ceiling: 5,
            max_settle_attempts: 30,
            pagination_ceiling: 50,
        }
    }
}

impl DriverConfig {
    /// Same ceilings, no waiting.
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            batch_delay_ms: 0,
            scroll_delay_ms: 0,
            pagination_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.idle_ceiling == 0 {
            return Err(Error::Config("driver.idle_ceiling must be at least 1".into()));
        }
        if self.max_settle_attempts == 0 {
            return Err(Error::Config(
                "driver.max_settle_attempts must be at least 1".into(),
            ));
        }
        if self.pagination_ceiling == 0 {
            return Err(Error::Config(
                "driver.pagination_ceiling must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// How a call to [`Driver::start`] ended.
#[derive(Debug)]
pub enum Outcome {
    /// Selected exactly the quota.
    QuotaMet,
    /// Quota missing or zero; nothing was attempted.
    NoQuota,
    /// The page stopped producing items or pages.
    IdleExhaustion,
    /// Another run was active; this call did nothing.
    DuplicateStart,
    /// Adapter failure, integrity violation or a panel that never rendered.
    Aborted(Error),
}

impl Outcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::QuotaMet => f.write_str("quota met"),
            Outcome::NoQuota => f.write_str("no quota"),
            Outcome::IdleExhaustion => f.write_str("no more results"),
            Outcome::DuplicateStart => f.write_str("duplicate start ignored"),
            Outcome::Aborted(e) => write!(f, "aborted: {}", e),
        }
    }
}

/// Result of one [`Driver::start`].
#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    pub planned: u32,
    pub selected: u32,
    pub credits_used: u32,
    /// Iterations that selected at least one item.
    pub batches: u32,
    /// "Show more" clicks.
    pub pages: u32,
    pub idle_iterations: u32,
    pub duration_ms: u64,
}

impl RunReport {
    fn new(outcome: Outcome, state: &SelectionState, elapsed: Duration) -> Self {
        Self {
            outcome,
            planned: state.planned(),
            selected: state.selected(),
            credits_used: state.credits_used(),
            batches: state.batches,
            pages: state.pages,
            idle_iterations: state.idle_iterations,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    fn duplicate() -> Self {
        Self::new(
            Outcome::DuplicateStart,
            &SelectionState::default(),
            Duration::ZERO,
        )
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: selected {}/{} in {} batches, {} pages, {}ms",
            self.outcome, self.selected, self.planned, self.batches, self.pages, self.duration_ms
        )
    }
}

/// Drives selection over a [`PageAdapter`].
pub struct Driver<A> {
    adapter: A,
    config: DriverConfig,
    running: Cell<bool>,
}

impl<A: PageAdapter> Driver<A> {
    pub fn new(adapter: A, config: DriverConfig) -> Self {
        Self {
            adapter,
            config,
            running: Cell::new(false),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Run once to a terminal outcome.
    ///
    /// Never fails: errors end the run as [`Outcome::Aborted`]. A call made
    /// while another run is active returns [`Outcome::DuplicateStart`]
    /// without touching the adapter.
    pub async fn start(&self) -> RunReport {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            info!("Duplicate start ignored, a run is already active");
            return RunReport::duplicate();
        };

        let started = Instant::now();
        let mut state = SelectionState::default();
        let outcome = match self.run(&mut state).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "Run aborted after {}/{} selected: {}",
                    state.selected(),
                    state.planned(),
                    e
                );
                Outcome::Aborted(e)
            }
        };

        let report = RunReport::new(outcome, &state, started.elapsed());
        info!("Done. {}", report);
        report
    }

    async fn run(&self, state: &mut SelectionState) -> Result<Outcome> {
        let planned = match self.adapter.read_quota().await? {
            Some(q) if q > 0 => q,
            _ => {
                info!("No available credits. Stopping.");
                return Ok(Outcome::NoQuota);
            }
        };
        *state = SelectionState::new(planned);
        info!("Starting selection of up to {} invitees", planned);

        let mut settle_attempts = 0;
        while !state.is_complete() {
            if !self.adapter.has_results_panel().await? {
                settle_attempts += 1;
                if settle_attempts > self.config.max_settle_attempts {
                    return Err(Error::PanelMissing {
                        attempts: self.config.max_settle_attempts,
                    });
                }
                debug!(
                    "Results panel not found yet ({}/{}), waiting",
                    settle_attempts, self.config.max_settle_attempts
                );
                pause(self.config.settle_delay_ms).await;
                continue;
            }
            settle_attempts = 0;

            let eligible: Vec<_> = self
                .adapter
                .list_selectable_items()
                .await?
                .into_iter()
                .filter(|item| item.is_eligible())
                .collect();

            if !eligible.is_empty() {
                let take = eligible.len().min(state.remaining() as usize);
                let mut clicked = 0;
                let mut confirmed = 0;
                for item in &eligible[..take] {
                    match self.adapter.select(item).await {
                        Ok(true) => confirmed += 1,
                        Ok(false) => debug!("{} did not register as selected", item),
                        Err(e) => {
                            // Clicks already issued stay on the page.
                            if clicked > 0 {
                                let _ = state.record_batch(clicked, confirmed);
                            }
                            return Err(e);
                        }
                    }
                    clicked += 1;
                }
                state.record_batch(clicked, confirmed)?;
                info!("{}", state.progress());
                pause(self.config.batch_delay_ms).await;
                continue;
            }

            if state.pages_since_selection >= self.config.pagination_ceiling {
                info!(
                    "{} pages loaded without new invitees, giving up",
                    state.pages_since_selection
                );
                return Ok(Outcome::IdleExhaustion);
            }

            self.adapter.request_scroll().await?;
            pause(self.config.scroll_delay_ms).await;

            if self.adapter.has_more_results_control().await? {
                info!("Clicking 'Show more results'...");
                self.adapter.activate_more_results_control().await?;
                state.record_page();
                info!("{}", state.progress());
                pause(self.config.pagination_delay_ms).await;
                continue;
            }

            let streak = state.record_idle();
            info!(
                "No invitees and no more results ({}/{})",
                streak, self.config.idle_ceiling
            );
            info!("{}", state.progress());
            if streak >= self.config.idle_ceiling {
                info!("No more results to load.");
                return Ok(Outcome::IdleExhaustion);
            }
        }

        Ok(Outcome::QuotaMet)
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let config = DriverConfig::default();
        assert_eq!(config.settle_delay_ms, 500);
        assert_eq!(config.batch_delay_ms, 1200);
        assert_eq!(config.scroll_delay_ms, 600);
        assert_eq!(config.idle_ceiling, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ceilings() {
        let config = DriverConfig {
            idle_ceiling: 0,
            ..DriverConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("idle_ceiling"));

        let config = DriverConfig {
            pagination_ceiling: 0,
            ..DriverConfig::immediate()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_report_display() {
        let mut state = SelectionState::new(10);
        state.record_batch(4, 4).unwrap();
        let report = RunReport::new(Outcome::IdleExhaustion, &state, Duration::from_millis(42));
        assert_eq!(
            report.to_string(),
            "no more results: selected 4/10 in 1 batches, 0 pages, 42ms"
        );
        assert!(!report.outcome.is_aborted());
    }
}
