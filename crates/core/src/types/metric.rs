//! Metric descriptors and query windows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of business metric a snapshot records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Customer lifetime value.
    Clv,
    /// Visitor-to-order conversion rate.
    ConversionRate,
    /// Revenue totals.
    Revenue,
}

impl MetricType {
    /// Stable string form used in storage and APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clv => "clv",
            Self::ConversionRate => "conversion_rate",
            Self::Revenue => "revenue",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clv" => Ok(Self::Clv),
            "conversion_rate" => Ok(Self::ConversionRate),
            "revenue" => Ok(Self::Revenue),
            _ => Err(format!("invalid metric type: {s}")),
        }
    }
}

/// Granularity of the period a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl PeriodType {
    /// Stable string form used in storage and APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!("invalid period type: {s}")),
        }
    }
}

/// Half-open-ended time window for metric queries.
///
/// Both bounds are optional; a missing bound leaves that side unconstrained.
/// Bounds are inclusive, matching how the reporting windows are built
/// (midnight to `23:59:59.999`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateWindow {
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    /// A fully unconstrained window.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Window between two instants, inclusive.
    #[must_use]
    pub const fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Whether an instant falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| at >= s) && self.end.is_none_or(|e| at <= e)
    }
}
