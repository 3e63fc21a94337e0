//! # Domain Models
//!
//! Read-only snapshots of the host catalog and of the view-tracking table.
//! Nothing here is created or mutated by the ranking; every request fetches
//! fresh values.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A catalog entry (product). Variants point at their parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    /// Variants inherit the parent's view count as a ranking signal
    pub parent_id: Option<i64>,
    pub title: String,
    pub published_at: NaiveDateTime,
}

/// Direction shared by every tie-break level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Only the literal `ASC` token is ascending; anything else, including an
    /// empty string, is descending.
    pub fn from_raw(raw: &str) -> Self {
        if raw == "ASC" {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation windows the view counter keeps, with its `type` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKind {
    Day,
    Week,
    Month,
    Year,
    Total,
}

impl PeriodKind {
    /// Value of the counter's `type` column for this window.
    pub fn type_code(self) -> i64 {
        match self {
            Self::Day => 0,
            Self::Week => 1,
            Self::Month => 2,
            Self::Year => 3,
            Self::Total => 4,
        }
    }
}

/// Aggregation window of the view-tracking table.
///
/// Identifiers: `total`, a year (`2024`), a month (`202402`), an ISO week
/// (`2024W07`) and a day (`20240215`). The counter stores months and weeks
/// with the same six-digit `period` text, so the kind is part of the value
/// and joins must filter on both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    kind: PeriodKind,
    /// Text of the counter's `period` column
    value: String,
}

impl Period {
    pub const TOTAL: &'static str = "total";

    pub fn total() -> Self {
        Self {
            kind: PeriodKind::Total,
            value: Self::TOTAL.to_string(),
        }
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    /// The counter's `period` column value.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The form [`FromStr`] accepts.
    pub fn identifier(&self) -> String {
        match self.kind {
            PeriodKind::Week => format!("{}W{}", &self.value[..4], &self.value[4..]),
            _ => self.value.clone(),
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::total()
    }
}

fn digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn in_range(value: &str, range: std::ops::RangeInclusive<u32>) -> bool {
    value.parse::<u32>().map(|n| range.contains(&n)).unwrap_or(false)
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value == Self::TOTAL {
            return Ok(Self::total());
        }

        let parsed = match value.split_once('W') {
            Some((year, week)) if year.len() == 4 && week.len() == 2 && digits(year) && digits(week) => {
                in_range(week, 1..=53).then(|| (PeriodKind::Week, format!("{year}{week}")))
            }
            Some(_) => None,
            None if digits(value) => match value.len() {
                4 => Some((PeriodKind::Year, value.to_string())),
                6 if in_range(&value[4..], 1..=12) => Some((PeriodKind::Month, value.to_string())),
                8 if NaiveDate::parse_from_str(value, "%Y%m%d").is_ok() => {
                    Some((PeriodKind::Day, value.to_string()))
                }
                _ => None,
            },
            None => None,
        };

        parsed.map(|(kind, value)| Self { kind, value }).ok_or_else(|| {
            AppError::ValidationError(format!(
                "invalid view period '{value}', expected 'total', YYYY, YYYYMM, YYYYWww or YYYYMMDD"
            ))
        })
    }
}

impl TryFrom<String> for Period {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.identifier()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}

/// One row of the view-tracking table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCount {
    pub item_id: i64,
    pub period: Period,
    pub count: i64,
}

/// `(item_id, period) -> count` lookup. A missing entry is unknown, not zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewCounts {
    by_period: HashMap<Period, HashMap<i64, i64>>,
}

impl ViewCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item_id: i64, period: Period, count: i64) {
        self.by_period.entry(period).or_default().insert(item_id, count);
    }

    pub fn get(&self, item_id: i64, period: &Period) -> Option<i64> {
        self.by_period.get(period)?.get(&item_id).copied()
    }
}

impl FromIterator<ViewCount> for ViewCounts {
    fn from_iter<I: IntoIterator<Item = ViewCount>>(iter: I) -> Self {
        let mut counts = Self::new();
        for row in iter {
            counts.insert(row.item_id, row.period, row.count);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_literal_asc_is_ascending() {
        assert_eq!(SortOrder::from_raw("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::from_raw("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::from_raw("asc"), SortOrder::Desc);
        assert_eq!(SortOrder::from_raw(""), SortOrder::Desc);
        assert_eq!(SortOrder::from_raw("ASC; DROP TABLE"), SortOrder::Desc);
    }

    #[test]
    fn period_accepts_known_windows() {
        let cases = [
            ("total", PeriodKind::Total, "total"),
            (" total ", PeriodKind::Total, "total"),
            ("2024", PeriodKind::Year, "2024"),
            ("202402", PeriodKind::Month, "202402"),
            ("2024W07", PeriodKind::Week, "202407"),
            ("2024W53", PeriodKind::Week, "202453"),
            ("20240215", PeriodKind::Day, "20240215"),
        ];
        for (raw, kind, column) in cases {
            let period: Period = raw.parse().unwrap();
            assert_eq!(period.kind(), kind, "{raw}");
            assert_eq!(period.as_str(), column, "{raw}");
        }
    }

    #[test]
    fn period_rejects_everything_else() {
        for bad in [
            "", "all", "TOTAL", "24", "202400", "202413", "202453", "2024W00", "2024W54", "24W07",
            "2024W7", "20240230", "2024-02", "total' OR 1=1",
        ] {
            assert!(
                matches!(bad.parse::<Period>(), Err(AppError::ValidationError(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn month_and_week_with_same_column_text_differ() {
        let month: Period = "202407".parse().unwrap();
        let week: Period = "2024W07".parse().unwrap();

        assert_eq!(month.as_str(), week.as_str());
        assert_ne!(month, week);
        assert_eq!(month.kind().type_code(), 2);
        assert_eq!(week.kind().type_code(), 1);
        assert_eq!(week.to_string(), "2024W07");
        assert_eq!(String::from(week.clone()).parse::<Period>().unwrap(), week);
    }

    #[test]
    fn period_deserializes_through_validation() {
        let ok: Period = serde_json::from_str("\"202402\"").unwrap();
        assert_eq!(ok.as_str(), "202402");
        assert!(serde_json::from_str::<Period>("\"weekly\"").is_err());
    }

    #[test]
    fn missing_view_count_is_unknown() {
        let counts: ViewCounts = [ViewCount { item_id: 1, period: Period::total(), count: 0 }]
            .into_iter()
            .collect();

        assert_eq!(counts.get(1, &Period::total()), Some(0));
        assert_eq!(counts.get(2, &Period::total()), None);
        assert_eq!(counts.get(1, &"2024".parse().unwrap()), None);
    }
}
