// SPDX-License-Identifier: Apache-2.0

use crate::date::parse_calendar_date;
use crate::serde_helpers::{null_as_default, text_or_number};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDatum {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub reported_value: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub calculated_payout: String,
}

impl DailyDatum {
    #[must_use]
    pub fn new(
        date: impl Into<String>,
        reported_value: impl Into<String>,
        calculated_payout: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            reported_value: reported_value.into(),
            calculated_payout: calculated_payout.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReportInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub daily_data: Vec<DailyDatum>,
}

impl ReportInfo {
    #[must_use]
    pub fn new(daily_data: Vec<DailyDatum>) -> Self {
        Self { daily_data }
    }

    /// Earliest and latest report dates that parse as calendar dates.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self
            .daily_data
            .iter()
            .filter_map(|d| parse_calendar_date(&d.date).ok());
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

/// Daily precipitation keyed by the exact date string the weather archive
/// returned. A missing key means the value has not been loaded yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherLookup(BTreeMap<String, f64>);

impl WeatherLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zips the archive's columnar response; `null` readings are left out.
    #[must_use]
    pub fn from_columns(dates: &[String], precipitation: &[Option<f64>]) -> Self {
        let mut out = BTreeMap::new();
        for (date, value) in dates.iter().zip(precipitation) {
            if let Some(mm) = value {
                out.insert(date.clone(), *mm);
            }
        }
        Self(out)
    }

    pub fn insert(&mut self, date: impl Into<String>, precipitation_mm: f64) {
        self.0.insert(date.into(), precipitation_mm);
    }

    #[must_use]
    pub fn get(&self, date: &str) -> Option<f64> {
        self.0.get(date).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
