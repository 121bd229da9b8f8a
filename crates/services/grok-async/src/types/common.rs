//! Shared enums used by the prompt builders

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Recency bound for X search
///
/// Sub-day windows cannot be expressed as a date range, so `15min`, `1hr` and
/// `4hr` all resolve to "today" when sent upstream.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum TimeWindow {
    /// Last 15 minutes
    #[serde(rename = "15min")]
    FifteenMinutes,
    /// Last hour
    #[serde(rename = "1hr")]
    OneHour,
    /// Last four hours (default)
    #[default]
    #[serde(rename = "4hr")]
    FourHours,
    /// Last 24 hours
    #[serde(rename = "24hr")]
    OneDay,
    /// Last seven days
    #[serde(rename = "7d")]
    SevenDays,
}

impl TimeWindow {
    /// All windows, shortest first
    pub const ALL: [Self; 5] = [
        Self::FifteenMinutes,
        Self::OneHour,
        Self::FourHours,
        Self::OneDay,
        Self::SevenDays,
    ];

    /// Wire tag (`15min`, `1hr`, `4hr`, `24hr`, `7d`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FifteenMinutes => "15min",
            Self::OneHour => "1hr",
            Self::FourHours => "4hr",
            Self::OneDay => "24hr",
            Self::SevenDays => "7d",
        }
    }

    /// Human phrase used inside instructions
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::FifteenMinutes => "the last 15 minutes",
            Self::OneHour => "the last hour",
            Self::FourHours => "the last 4 hours",
            Self::OneDay => "the last 24 hours",
            Self::SevenDays => "the last 7 days",
        }
    }

    /// Whole days subtracted from `today` to get `from_date`
    #[must_use]
    pub const fn lookback_days(self) -> u64 {
        match self {
            Self::FifteenMinutes | Self::OneHour | Self::FourHours => 0,
            Self::OneDay => 1,
            Self::SevenDays => 7,
        }
    }

    /// Inclusive `(from_date, to_date)` for this window ending on `today`
    #[must_use]
    pub fn date_range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = today
            .checked_sub_days(Days::new(self.lookback_days()))
            .unwrap_or(today);
        (from, today)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid time window '{s}' (expected 15min|1hr|4hr|24hr|7d)"))
    }
}

/// What the search instruction asks the model to extract
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Sentiment only
    Sentiment,
    /// Themes only
    Themes,
    /// Sentiment and themes (default)
    #[default]
    Both,
}

impl AnalysisType {
    /// Wire tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sentiment => "sentiment",
            Self::Themes => "themes",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentiment" => Ok(Self::Sentiment),
            "themes" => Ok(Self::Themes),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "invalid analysis type '{other}' (expected sentiment|themes|both)"
            )),
        }
    }
}
