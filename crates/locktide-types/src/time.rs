//! Time units and the week clock.

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Week index: whole weeks since the unix epoch, under a given week length.
pub type Week = u64;

pub const DAY: u64 = 86_400;
pub const WEEK: u64 = 7 * DAY;
/// Calendar-agnostic month used by the emission checkpoints.
pub const MONTH: u64 = 30 * DAY;
pub const YEAR: u64 = 365 * DAY;

/// Week index containing `now`. A zero week length maps everything to week 0.
pub fn week_of(now: Timestamp, week_seconds: u64) -> Week {
    now.checked_div(week_seconds).unwrap_or(0)
}

/// Whole weeks between `start` and the week containing `now` (saturating).
pub fn weeks_since(start: Week, now: Timestamp, week_seconds: u64) -> u64 {
    week_of(now, week_seconds).saturating_sub(start)
}
