//! Sync window planning.
//!
//! A sync cycle covers a contiguous, inclusive date range. The range
//! resumes from the last acknowledged sync date (minus a lookback, so
//! late edits in the accounting books are re-exported) and is capped so
//! a connector that has been offline for months catches up in bounded
//! chunks rather than one giant export.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive date range a single sync cycle exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl SyncWindow {
    /// Plans the next window starting at `resume` and ending today,
    /// capped at `max_days`. Returns `None` when `resume` is in the
    /// future, meaning there is nothing to sync yet.
    #[must_use]
    pub fn plan(resume: NaiveDate, today: NaiveDate, max_days: u64) -> Option<Self> {
        if resume > today {
            return None;
        }
        let capped = resume
            .checked_add_days(Days::new(max_days.saturating_sub(1)))
            .unwrap_or(today);
        Some(Self {
            from: resume,
            to: capped.min(today),
        })
    }

    /// Number of calendar days covered, inclusive of both endpoints.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn recent_resume_runs_up_to_today() {
        let w = SyncWindow::plan(d("2025-03-10"), d("2025-03-14"), 30).unwrap();
        assert_eq!(w.from, d("2025-03-10"));
        assert_eq!(w.to, d("2025-03-14"));
        assert_eq!(w.days(), 5);
    }

    #[test]
    fn long_backlog_is_capped() {
        let w = SyncWindow::plan(d("2025-01-01"), d("2025-06-01"), 30).unwrap();
        assert_eq!(w.from, d("2025-01-01"));
        assert_eq!(w.to, d("2025-01-30"));
        assert_eq!(w.days(), 30);
    }

    #[test]
    fn future_resume_yields_no_window() {
        assert_eq!(SyncWindow::plan(d("2025-03-15"), d("2025-03-14"), 30), None);
    }

    #[test]
    fn resume_today_is_a_single_day_window() {
        let w = SyncWindow::plan(d("2025-03-14"), d("2025-03-14"), 30).unwrap();
        assert_eq!(w.from, w.to);
        assert_eq!(w.days(), 1);
    }
}
