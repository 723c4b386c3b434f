//! Time handling: the fixed production cycle and calendar periods.
//!
//! Live production runs on an accumulator: the host feeds wall-clock deltas,
//! [`CycleClock`] converts them into whole production cycles and carries the
//! remainder, which keeps the roll cadence deterministic and testable.
//!
//! Missions run on calendar periods. Days roll at local midnight; weeks are
//! Monday-aligned, so a Sunday belongs to the week that started six days
//! earlier.

use chrono::{Datelike, Duration, NaiveDate};

/// Largest delta accepted by a single [`CycleClock::advance`]. Longer gaps
/// (suspended tab, closed app) are the offline simulator's job.
pub const MAX_LIVE_DELTA_SECONDS: f64 = 10.0;

#[derive(Debug, Default, Clone)]
pub struct CycleClock {
    /// Seconds not yet consumed as cycles.
    accumulator: f64,
    /// Total cycles completed since creation.
    pub total_cycles: u64,
}

impl CycleClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `seconds` of wall-clock time. Returns the number of whole cycles
    /// of length `cycle_seconds` that completed.
    pub fn advance(&mut self, seconds: f64, cycle_seconds: f64) -> u32 {
        if !cycle_seconds.is_finite() || cycle_seconds <= 0.0 {
            return 0;
        }
        let delta = if seconds.is_finite() {
            seconds.clamp(0.0, MAX_LIVE_DELTA_SECONDS)
        } else {
            0.0
        };

        self.accumulator += delta;
        let cycles = (self.accumulator / cycle_seconds).floor() as u32;
        self.accumulator -= cycles as f64 * cycle_seconds;
        self.total_cycles += cycles as u64;
        cycles
    }

    /// Drop any partially elapsed cycle.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

// ── Calendar ────────────────────────────────────────────────────────────────

/// 1970-01-01, the fallback for unreadable stored dates. Anything compared
/// against it is due for a rollover.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn daily_rollover_due(last_reset: NaiveDate, today: NaiveDate) -> bool {
    last_reset < today
}

pub fn weekly_rollover_due(last_reset: NaiveDate, today: NaiveDate) -> bool {
    week_start(last_reset) < week_start(today)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a stored `YYYY-MM-DD` date. Unreadable input yields [`epoch`],
/// which forces an immediate rollover instead of failing the load.
pub fn parse_date_or_epoch(raw: &str) -> NaiveDate {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date,
        Err(e) => {
            log::warn!("unreadable calendar date '{raw}' ({e}), falling back to epoch");
            epoch()
        }
    }
}

/// Seconds between two unix timestamps, never negative.
pub fn elapsed_between(last_seen_unix: i64, now_unix: i64) -> f64 {
    now_unix.saturating_sub(last_seen_unix).max(0) as f64
}
