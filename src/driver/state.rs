use crate::{Error, Result};
use std::cell::Cell;

/// Counters for one run. Created when the quota is read, dropped when the
/// run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    planned: u32,
    selected: u32,
    credits_used: u32,
    /// Consecutive iterations with no selection and no pagination.
    pub idle_streak: u32,
    /// Consecutive pagination clicks since the last selection.
    pub pages_since_selection: u32,
    pub batches: u32,
    pub pages: u32,
    pub idle_iterations: u32,
}

impl SelectionState {
    pub fn new(planned: u32) -> Self {
        Self {
            planned,
            ..Self::default()
        }
    }

    pub fn planned(&self) -> u32 {
        self.planned
    }

    /// Items the driver asked the page to select.
    pub fn selected(&self) -> u32 {
        self.selected
    }

    /// Items the page confirmed as selected.
    pub fn credits_used(&self) -> u32 {
        self.credits_used
    }

    pub fn remaining(&self) -> u32 {
        self.planned - self.selected
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Commit one batch: `requested` clicks issued, `confirmed` of them took.
    ///
    /// Both counters move together; any disagreement afterwards is fatal.
    pub fn record_batch(&mut self, requested: u32, confirmed: u32) -> Result<()> {
        if requested > self.remaining() {
            return Err(Error::Adapter(format!(
                "batch of {} exceeds remaining quota {}",
                requested,
                self.remaining()
            )));
        }
        self.selected += requested;
        self.credits_used += confirmed;
        self.batches += 1;
        self.idle_streak = 0;
        self.pages_since_selection = 0;
        self.check()
    }

    pub fn record_page(&mut self) {
        self.pages += 1;
        self.pages_since_selection += 1;
    }

    /// Returns the new streak length.
    pub fn record_idle(&mut self) -> u32 {
        self.idle_iterations += 1;
        self.idle_streak += 1;
        self.idle_streak
    }

    /// Progress line logged after each batch, page and idle iteration.
    pub fn progress(&self) -> String {
        format!(
            "Selected {}/{} (credits used {}/{})",
            self.selected, self.planned, self.credits_used, self.planned
        )
    }

    /// `selected <= planned` and `selected == credits_used`.
    pub fn check(&self) -> Result<()> {
        if self.selected > self.planned || self.selected != self.credits_used {
            return Err(Error::IntegrityMismatch {
                planned: self.planned,
                selected: self.selected,
                credits_used: self.credits_used,
            });
        }
        Ok(())
    }
}

/// Holds the driver's `running` flag for the duration of one run.
///
/// Acquiring checks and sets in one step; dropping always clears, so the
/// flag is released on every exit path including unwinding.
pub struct RunGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> RunGuard<'a> {
    /// `None` if a run already holds the flag.
    pub fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_invariants() {
        let state = SelectionState::new(10);
        assert_eq!(state.planned(), 10);
        assert_eq!(state.selected(), 0);
        assert_eq!(state.remaining(), 10);
        assert!(state.check().is_ok());
    }

    #[test]
    fn test_record_batch_keeps_remaining_in_sync() {
        let mut state = SelectionState::new(10);
        state.idle_streak = 3;
        state.pages_since_selection = 2;
        state.record_batch(4, 4).unwrap();
        assert_eq!(state.selected(), 4);
        assert_eq!(state.credits_used(), 4);
        assert_eq!(state.remaining(), 6);
        assert_eq!(state.idle_streak, 0);
        assert_eq!(state.pages_since_selection, 0);

        assert_eq!(state.progress(), "Selected 4/10 (credits used 4/10)");

        state.record_batch(6, 6).unwrap();
        assert!(state.is_complete());
        assert_eq!(state.batches, 2);
    }

    #[test]
    fn test_unconfirmed_click_is_integrity_mismatch() {
        let mut state = SelectionState::new(5);
        let err = state.record_batch(3, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::IntegrityMismatch {
                selected: 3,
                credits_used: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_batch_rejected_without_mutation() {
        let mut state = SelectionState::new(2);
        assert!(state.record_batch(3, 3).is_err());
        assert_eq!(state.selected(), 0);
        assert_eq!(state.remaining(), 2);
    }

    #[test]
    fn test_idle_and_page_counters() {
        let mut state = SelectionState::new(1);
        assert_eq!(state.record_idle(), 1);
        assert_eq!(state.record_idle(), 2);
        state.record_page();
        assert_eq!(state.progress(), "Selected 0/1 (credits used 0/1)");
        assert_eq!(state.idle_streak, 2);
        assert_eq!(state.pages, 1);
        assert_eq!(state.pages_since_selection, 1);
        assert_eq!(state.idle_iterations, 2);
    }

    #[test]
    fn test_run_guard_is_exclusive_and_releases() {
        let flag = Cell::new(false);
        let guard = RunGuard::acquire(&flag).unwrap();
        assert!(flag.get());
        assert!(RunGuard::acquire(&flag).is_none());
        assert!(flag.get());
        drop(guard);
        assert!(!flag.get());
        assert!(RunGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_run_guard_releases_on_panic() {
        let flag = Cell::new(false);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = RunGuard::acquire(&flag);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!flag.get());
    }
}
