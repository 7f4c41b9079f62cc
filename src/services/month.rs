// src/services/month.rs
//
// Calendar-month arithmetic for payroll periods and dashboard windows.
// Months are carried as `YearMonth` values rather than "YYYY-MM" strings.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, str::FromStr};
use utoipa::ToSchema;

/// Number of months shown by the rolling dashboard charts.
pub const ROLLING_WINDOW_MONTHS: u32 = 12;

/// A calendar month. Internally the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month chrono can represent.
        Self(date - chrono::Days::new(u64::from(date.day0())))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    pub fn next(self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }

    pub fn minus_months(self, n: u32) -> Option<Self> {
        self.0.checked_sub_months(Months::new(n)).map(Self)
    }

    /// Short human label, e.g. `Mar 2025`.
    pub fn label(self) -> String {
        self.0.format("%b %Y").to_string()
    }

    /// January through December of `year`.
    pub fn months_of_year(year: i32) -> Vec<Self> {
        (1..=12).filter_map(|m| Self::new(year, m)).collect()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid month {0:?}, expected YYYY-MM")]
pub struct ParseYearMonthError(String);

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    /// Accepts `YYYY-MM`, or a full `YYYY-MM-DD` date whose month is taken.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }
        let err = || ParseYearMonthError(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Every month from `start` to `end`, both inclusive, in ascending order.
/// Empty when `start > end`.
pub fn month_range(start: YearMonth, end: YearMonth) -> Vec<YearMonth> {
    std::iter::successors(Some(start), |m| m.next())
        .take_while(|m| *m <= end)
        .collect()
}

/// The rolling window ending at the month containing `today`:
/// `current - (months - 1) ..= current`.
pub fn rolling_window(today: NaiveDate, months: u32) -> Option<(YearMonth, YearMonth)> {
    let end = YearMonth::from_date(today);
    let start = end.minus_months(months.saturating_sub(1))?;
    Some((start, end))
}

/// One point of a monthly series.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthTotal {
    #[schema(value_type = String, example = "2025-03")]
    pub month: YearMonth,
    pub label: String,
    pub total: Decimal,
}

/// Zero-filled running totals over a fixed, contiguous run of months.
#[derive(Debug, Clone)]
pub struct MonthBuckets {
    totals: BTreeMap<YearMonth, Decimal>,
}

impl MonthBuckets {
    pub fn new(start: YearMonth, end: YearMonth) -> Self {
        Self::from_months(month_range(start, end))
    }

    pub fn from_months(months: impl IntoIterator<Item = YearMonth>) -> Self {
        Self {
            totals: months.into_iter().map(|m| (m, Decimal::ZERO)).collect(),
        }
    }

    /// Adds `amount` to `month`. Months outside the window are ignored and
    /// reported back as `false`.
    pub fn add(&mut self, month: YearMonth, amount: Decimal) -> bool {
        match self.totals.get_mut(&month) {
            Some(total) => {
                *total = total.saturating_add(amount);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, month: YearMonth) -> Option<Decimal> {
        self.totals.get(&month).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, Decimal)> + '_ {
        self.totals.iter().map(|(m, t)| (*m, *t))
    }

    pub fn into_totals(self) -> Vec<MonthTotal> {
        self.totals
            .into_iter()
            .map(|(month, total)| MonthTotal {
                month,
                label: month.label(),
                total,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_formats_year_month() {
        assert_eq!(ym("2025-03").to_string(), "2025-03");
        assert_eq!(ym("2025-03-17"), ym("2025-03"));
        assert_eq!(ym("2025-03").label(), "Mar 2025");
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("2025-3".parse::<YearMonth>().is_err());
        assert!("march".parse::<YearMonth>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&ym("2024-11")).unwrap();
        assert_eq!(json, "\"2024-11\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ym("2024-11"));
    }

    #[test]
    fn range_crosses_year_boundary() {
        let months = month_range(ym("2024-11"), ym("2025-02"));
        let labels: Vec<String> = months.iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["2024-11", "2024-12", "2025-01", "2025-02"]);
    }

    #[test]
    fn range_is_empty_when_reversed() {
        assert!(month_range(ym("2025-02"), ym("2024-11")).is_empty());
    }

    #[test]
    fn rolling_window_from_leap_day() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = rolling_window(today, ROLLING_WINDOW_MONTHS).unwrap();
        assert_eq!(start, ym("2023-03"));
        assert_eq!(end, ym("2024-02"));
    }

    #[test]
    fn buckets_ignore_months_outside_window() {
        let mut buckets = MonthBuckets::new(ym("2025-01"), ym("2025-03"));
        assert!(buckets.add(ym("2025-02"), dec!(10)));
        assert!(buckets.add(ym("2025-02"), dec!(5.5)));
        assert!(!buckets.add(ym("2025-04"), dec!(100)));

        let totals = buckets.into_totals();
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].total, Decimal::ZERO);
        assert_eq!(totals[1].total, dec!(15.5));
        assert_eq!(totals[1].label, "Feb 2025");
        assert_eq!(totals[2].total, Decimal::ZERO);
    }

    #[test]
    fn bucket_totals_saturate() {
        let mut buckets = MonthBuckets::new(ym("2025-01"), ym("2025-01"));
        assert!(buckets.add(ym("2025-01"), Decimal::MAX));
        assert!(buckets.add(ym("2025-01"), Decimal::MAX));
        assert_eq!(buckets.get(ym("2025-01")), Some(Decimal::MAX));
    }

    proptest! {
        #[test]
        fn twelve_month_window_is_contiguous(days in 0i64..36_500) {
            let today = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Days::new(days as u64);
            let (start, end) = rolling_window(today, ROLLING_WINDOW_MONTHS).unwrap();
            let months = month_range(start, end);

            prop_assert_eq!(months.len(), 12);
            prop_assert_eq!(*months.last().unwrap(), YearMonth::from_date(today));
            for pair in months.windows(2) {
                prop_assert!(pair[0] < pair[1]);
                prop_assert_eq!(pair[0].next(), Some(pair[1]));
            }
        }
    }
}
