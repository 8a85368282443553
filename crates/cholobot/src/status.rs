//! Mutable stream state and the status derived from it on every refresh.

use chrono::{DateTime, Utc, Weekday};
use chrono_tz::America::Montevideo;
use chrono_tz::Tz;

use crate::schedule::{TimeOfDay, TimeWindow};

const DEFAULT_WINDOW: TimeWindow =
    TimeWindow::new(TimeOfDay::new(18, 0), TimeOfDay::new(22, 0));

/// State mutated only by operator commands. Lives in memory for the lifetime
/// of the process; a restart falls back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamState {
    pub cancelled_today: bool,
    pub window: TimeWindow,
}

impl Default for StreamState {
    fn default() -> Self {
        Self {
            cancelled_today: false,
            window: DEFAULT_WINDOW,
        }
    }
}

impl StreamState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What the detailed-status field reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    /// Cancelled by a moderator, or a weekend day.
    NoStreamToday,
    /// A stream day, not live yet.
    ScheduledLater,
    /// Live right now.
    LiveNow,
}

/// Cancellation and weekends take priority over the live signal. The ON/OFF
/// indicator rendered next to this field is the raw signal and is not gated
/// here; the two fields are allowed to disagree.
pub fn evaluate(live: bool, cancelled_today: bool, weekday: Weekday) -> DisplayStatus {
    if cancelled_today || is_weekend(weekday) {
        DisplayStatus::NoStreamToday
    } else if !live {
        DisplayStatus::ScheduledLater
    } else {
        DisplayStatus::LiveNow
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Current instant on the Montevideo clock (UTC-3, fixed since 2015).
pub fn now_montevideo() -> DateTime<Tz> {
    Utc::now().with_timezone(&Montevideo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_without_live_signal_is_scheduled() {
        assert_eq!(
            evaluate(false, false, Weekday::Mon),
            DisplayStatus::ScheduledLater
        );
    }

    #[test]
    fn weekday_with_live_signal_is_live() {
        assert_eq!(evaluate(true, false, Weekday::Wed), DisplayStatus::LiveNow);
    }

    #[test]
    fn cancellation_overrides_live_signal() {
        assert_eq!(
            evaluate(true, true, Weekday::Mon),
            DisplayStatus::NoStreamToday
        );
    }

    #[test]
    fn weekend_overrides_live_signal() {
        // the detailed field reports no stream even though the broadcaster
        // is live; the ON/OFF indicator still shows ON for the same input
        let live = true;
        assert_eq!(
            evaluate(live, false, Weekday::Sat),
            DisplayStatus::NoStreamToday
        );
        assert_eq!(
            evaluate(live, false, Weekday::Sun),
            DisplayStatus::NoStreamToday
        );
        assert!(live);
    }

    #[test]
    fn default_window_is_six_to_ten() {
        assert_eq!(StreamState::default().window.to_string(), "18:00 - 22:00");
        assert!(!StreamState::default().cancelled_today);
    }

    #[test]
    fn reset_restores_startup_defaults() {
        let mut state = StreamState {
            cancelled_today: true,
            window: TimeWindow::new("09:30".parse().unwrap(), "11:00".parse().unwrap()),
        };
        state.reset();
        assert_eq!(state, StreamState::default());
        assert_eq!(state.window.to_string(), "18:00 - 22:00");
    }
}
