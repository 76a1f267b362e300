//! Tick and duration formatting for log lines and simulator summaries.
//!
//! The scheduler only knows logical ticks. Anything shown to an operator goes
//! through here so a tick count is always printed next to its nominal
//! wall-clock equivalent at the configured tick rate.

/// Convert a tick count to nominal seconds at `tick_rate` ticks per second.
///
/// A zero tick rate yields `0.0` rather than dividing by zero.
///
/// # Examples
/// ```
/// use meltdown_types::formatting::ticks_to_secs;
/// assert_eq!(ticks_to_secs(100, 20), 5.0);
/// assert_eq!(ticks_to_secs(0, 20), 0.0);
/// assert_eq!(ticks_to_secs(40, 0), 0.0);
/// ```
pub fn ticks_to_secs(ticks: u64, tick_rate: u32) -> f64 {
    if tick_rate == 0 {
        return 0.0;
    }
    ticks as f64 / f64::from(tick_rate)
}

/// Format a tick span as `N ticks (X.XXs)`.
///
/// # Examples
/// ```
/// use meltdown_types::formatting::format_ticks;
/// assert_eq!(format_ticks(100, 20), "100 ticks (5.00s)");
/// assert_eq!(format_ticks(1, 20), "1 tick (0.05s)");
/// ```
pub fn format_ticks(ticks: u64, tick_rate: u32) -> String {
    let unit = if ticks == 1 { "tick" } else { "ticks" };
    format!("{} {} ({:.2}s)", ticks, unit, ticks_to_secs(ticks, tick_rate))
}

/// Format a nominal duration in seconds as `M:SS`, rounding to the nearest second.
///
/// # Examples
/// ```
/// use meltdown_types::formatting::format_clock;
/// assert_eq!(format_clock(125.7), "2:06");
/// assert_eq!(format_clock(5.0), "0:05");
/// assert_eq!(format_clock(-3.0), "0:00");
/// ```
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format an absolute tick as `tick N @ M:SS` for timeline logs.
pub fn format_timeline(tick: u64, tick_rate: u32) -> String {
    format!(
        "tick {} @ {}",
        tick,
        format_clock(ticks_to_secs(tick, tick_rate))
    )
}
