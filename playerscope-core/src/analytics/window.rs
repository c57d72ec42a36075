//! Time ranges and analysis windows
//!
//! Every aggregate is scoped to a half-open window `[start, end)`.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Requested lookback for an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "90d")]
    Days90,
    #[serde(rename = "180d")]
    Days180,
    #[serde(rename = "365d")]
    Days365,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Days7 => "7d",
            TimeRange::Days30 => "30d",
            TimeRange::Days90 => "90d",
            TimeRange::Days180 => "180d",
            TimeRange::Days365 => "365d",
        }
    }

    /// Nominal length in days.
    pub fn days(&self) -> i64 {
        match self {
            TimeRange::Days7 => 7,
            TimeRange::Days30 => 30,
            TimeRange::Days90 => 90,
            TimeRange::Days180 => 180,
            TimeRange::Days365 => 365,
        }
    }

    /// Whether the value-score analyzer accepts this range (7d is too short).
    pub fn is_value_range(&self) -> bool {
        !matches!(self, TimeRange::Days7)
    }

    /// Fixed-length window of `days()` ending at `now`.
    pub fn window_ending(&self, now: DateTime<Utc>) -> AnalysisWindow {
        AnalysisWindow::trailing(now, self.days())
    }

    /// Window ending at `now`, with 365d taken as twelve calendar months.
    pub fn calendar_window_ending(&self, now: DateTime<Utc>) -> AnalysisWindow {
        match self {
            TimeRange::Days365 => {
                let start = now
                    .checked_sub_months(Months::new(12))
                    .unwrap_or_else(|| now - Duration::days(365));
                AnalysisWindow { start, end: now }
            }
            other => other.window_ending(now),
        }
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(TimeRange::Days7),
            "30d" => Ok(TimeRange::Days30),
            "90d" => Ok(TimeRange::Days90),
            "180d" => Ok(TimeRange::Days180),
            "365d" => Ok(TimeRange::Days365),
            _ => Err(format!("unknown time range: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisWindow {
    /// Window of `days` days ending at `end`.
    pub fn trailing(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    /// Whole days covered (truncated).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + (self.end - self.start) / 2
    }

    /// `[start, midpoint)` and `[midpoint, end)`.
    pub fn halves(&self) -> (AnalysisWindow, AnalysisWindow) {
        let mid = self.midpoint();
        (
            AnalysisWindow {
                start: self.start,
                end: mid,
            },
            AnalysisWindow {
                start: mid,
                end: self.end,
            },
        )
    }

    /// The window of equal length immediately preceding this one.
    pub fn previous(&self) -> AnalysisWindow {
        AnalysisWindow {
            start: self.start - (self.end - self.start),
            end: self.start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_time_range_parse() {
        assert_eq!("30d".parse::<TimeRange>().unwrap(), TimeRange::Days30);
        assert!("14d".parse::<TimeRange>().is_err());
        let parsed: TimeRange = serde_json::from_str("\"180d\"").unwrap();
        assert_eq!(parsed, TimeRange::Days180);
    }

    #[test]
    fn test_calendar_year_window() {
        let window = TimeRange::Days365.calendar_window_ending(at(2024, 3, 1));
        assert_eq!(window.start, at(2023, 3, 1));
        // 2023-03-01..2024-03-01 spans a leap day
        assert_eq!(window.days(), 366);
    }

    #[test]
    fn test_previous_window_abuts() {
        let window = TimeRange::Days30.window_ending(at(2024, 6, 30));
        let prev = window.previous();
        assert_eq!(prev.end, window.start);
        assert_eq!(prev.days(), 30);
    }

    #[test]
    fn test_halves_split_at_midpoint() {
        let window = AnalysisWindow::trailing(at(2024, 1, 11), 10);
        let (first, second) = window.halves();
        assert_eq!(first.end, at(2024, 1, 6));
        assert_eq!(second.start, first.end);
    }
}
