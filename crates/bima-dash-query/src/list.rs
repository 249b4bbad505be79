// SPDX-License-Identifier: Apache-2.0

use crate::page::Page;
use bima_dash_model::Contract;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Region,
    Beneficiaries,
    Premium,
    Payout,
    Status,
    Created,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        Self::Region,
        Self::Beneficiaries,
        Self::Premium,
        Self::Payout,
        Self::Status,
        Self::Created,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Beneficiaries => "beneficiaries",
            Self::Premium => "premium",
            Self::Payout => "payout",
            Self::Status => "status",
            Self::Created => "created",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Region => "Region",
            Self::Beneficiaries => "Beneficiaries",
            Self::Premium => "Premium",
            Self::Payout => "Payout",
            Self::Status => "Status",
            Self::Created => "Created At",
        }
    }

    /// Accepts the short names plus the gateway field names.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "region" => Some(Self::Region),
            "beneficiaries" => Some(Self::Beneficiaries),
            "premium" | "total_premium" => Some(Self::Premium),
            "payout" | "total_claim_amount" | "settlement_amount" => Some(Self::Payout),
            "status" | "is_fulfilled" => Some(Self::Status),
            "created" | "created_at" => Some(Self::Created),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "▲",
            Self::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Created,
            direction: SortDirection::Asc,
        }
    }
}

impl SortState {
    #[must_use]
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Column-header click: same column flips direction, another column
    /// starts ascending.
    #[must_use]
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::new(key, SortDirection::Asc)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractFilter {
    pub search_term: String,
    pub region: String,
    pub created_cutoff: Option<NaiveDate>,
}

impl ContractFilter {
    #[must_use]
    pub fn matches(&self, contract: &Contract) -> bool {
        if !self.region.is_empty() && contract.region.name != self.region {
            return false;
        }
        if !self.search_term.is_empty()
            && !contract.id.contains(&self.search_term)
            && !contract
                .beneficiaries
                .iter()
                .any(|b| b.contains(&self.search_term))
        {
            return false;
        }
        match self.created_cutoff {
            Some(cutoff) => contract.created_date().is_some_and(|d| d >= cutoff),
            None => true,
        }
    }
}

/// Order-preserving subsequence of `all` accepted by `filter`.
#[must_use]
pub fn filter_contracts(all: &[Contract], filter: &ContractFilter) -> Vec<Contract> {
    all.iter().filter(|c| filter.matches(c)).cloned().collect()
}

#[must_use]
pub fn compare_by_key(a: &Contract, b: &Contract, key: SortKey) -> Ordering {
    match key {
        SortKey::Region => a.region.name.cmp(&b.region.name),
        SortKey::Beneficiaries => a.beneficiary_count().cmp(&b.beneficiary_count()),
        SortKey::Premium => a.total_premium.total_cmp(&b.total_premium),
        SortKey::Payout => a.total_claim_amount.total_cmp(&b.total_claim_amount),
        SortKey::Status => a.is_fulfilled.cmp(&b.is_fulfilled),
        SortKey::Created => a.created_date().cmp(&b.created_date()),
    }
}

/// Stable sort. Descending order reverses the comparator so equal keys keep
/// their input order in both directions.
pub fn sort_contracts(items: &mut [Contract], sort: SortState) {
    items.sort_by(|a, b| {
        let ord = compare_by_key(a, b, sort.key);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Distinct region names in first-seen order.
#[must_use]
pub fn region_options(all: &[Contract]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for c in all {
        if !out.iter().any(|r| *r == c.region.name) {
            out.push(c.region.name.clone());
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub filter: ContractFilter,
    pub sort: SortState,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    /// Filtered, gateway order. Feeds the map and infographics.
    pub filtered: Vec<Contract>,
    /// Filtered and sorted. Feeds the table and CSV export.
    pub sorted: Vec<Contract>,
    pub page: Page<Contract>,
}

/// filter → sort → paginate, with the page clamped into range.
#[must_use]
pub fn run_list_pipeline(all: &[Contract], query: &ListQuery, page_size: usize) -> ListView {
    let filtered = filter_contracts(all, &query.filter);
    let mut sorted = filtered.clone();
    sort_contracts(&mut sorted, query.sort);
    let page = Page::clamped(&sorted, query.page, page_size);
    ListView {
        filtered,
        sorted,
        page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bima_dash_model::Beneficiary;

    fn addr(s: &str) -> Beneficiary {
        Beneficiary::Address(s.to_string())
    }

    fn scenario() -> Vec<Contract> {
        vec![
            Contract::new("A", "Nyeri")
                .with_premium(100.0)
                .with_beneficiaries(vec![addr("x"), addr("y")])
                .with_created_at("2025-06-20"),
            Contract::new("B", "Kitengela")
                .with_premium(50.0)
                .with_created_at("2025-06-30"),
        ]
    }

    fn ids(items: &[Contract]) -> Vec<&str> {
        items.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn region_filter_and_premium_sort_scenario() {
        let all = scenario();
        let filter = ContractFilter {
            region: "Kitengela".to_string(),
            ..ContractFilter::default()
        };
        assert_eq!(ids(&filter_contracts(&all, &filter)), vec!["B"]);

        let mut sorted = all.clone();
        sort_contracts(&mut sorted, SortState::new(SortKey::Premium, SortDirection::Asc));
        assert_eq!(ids(&sorted), vec!["B", "A"]);
    }

    #[test]
    fn search_matches_id_or_beneficiary_case_sensitively() {
        let all = scenario();
        let by_id = ContractFilter {
            search_term: "A".to_string(),
            ..ContractFilter::default()
        };
        assert_eq!(ids(&filter_contracts(&all, &by_id)), vec!["A"]);

        let by_beneficiary = ContractFilter {
            search_term: "y".to_string(),
            ..ContractFilter::default()
        };
        assert_eq!(ids(&filter_contracts(&all, &by_beneficiary)), vec!["A"]);

        let wrong_case = ContractFilter {
            search_term: "a".to_string(),
            ..ContractFilter::default()
        };
        assert!(filter_contracts(&all, &wrong_case).is_empty());
    }

    #[test]
    fn cutoff_is_optional_and_inclusive() {
        let all = scenario();
        let cutoff = ContractFilter {
            created_cutoff: NaiveDate::from_ymd_opt(2025, 6, 24),
            ..ContractFilter::default()
        };
        assert_eq!(ids(&filter_contracts(&all, &cutoff)), vec!["B"]);

        let on_the_day = ContractFilter {
            created_cutoff: NaiveDate::from_ymd_opt(2025, 6, 30),
            ..ContractFilter::default()
        };
        assert_eq!(ids(&filter_contracts(&all, &on_the_day)), vec!["B"]);
        assert_eq!(
            ids(&filter_contracts(&all, &ContractFilter::default())),
            vec!["A", "B"]
        );
    }

    #[test]
    fn descending_sort_keeps_ties_in_input_order() {
        let all = vec![
            Contract::new("1", "Nyeri").with_premium(10.0),
            Contract::new("2", "Nyeri").with_premium(20.0),
            Contract::new("3", "Nyeri").with_premium(10.0),
        ];
        let mut sorted = all.clone();
        sort_contracts(&mut sorted, SortState::new(SortKey::Premium, SortDirection::Desc));
        assert_eq!(ids(&sorted), vec!["2", "1", "3"]);
        sort_contracts(&mut sorted, SortState::new(SortKey::Region, SortDirection::Desc));
        assert_eq!(ids(&sorted), vec!["2", "1", "3"]);
    }

    #[test]
    fn created_sort_is_chronological_not_lexicographic() {
        let all = vec![
            Contract::new("late", "Nyeri").with_created_at("2025-07-01T00:00:00Z"),
            Contract::new("early", "Nyeri").with_created_at("2025-06-09"),
            Contract::new("bad", "Nyeri").with_created_at("n/a"),
        ];
        let mut sorted = all.clone();
        sort_contracts(&mut sorted, SortState::default());
        assert_eq!(ids(&sorted), vec!["bad", "early", "late"]);
    }

    #[test]
    fn toggle_flips_same_column_and_resets_other_columns() {
        let s = SortState::default();
        let s = s.toggle(SortKey::Created);
        assert_eq!(s.direction, SortDirection::Desc);
        let s = s.toggle(SortKey::Payout);
        assert_eq!(s, SortState::new(SortKey::Payout, SortDirection::Asc));
    }

    #[test]
    fn sort_key_parses_short_and_gateway_names() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(SortKey::parse("settlement_amount"), Some(SortKey::Payout));
        assert_eq!(SortKey::parse("nope"), None);
    }

    #[test]
    fn region_options_are_distinct_in_first_seen_order() {
        let all = vec![
            Contract::new("1", "Nyeri"),
            Contract::new("2", "Kitengela"),
            Contract::new("3", "Nyeri"),
        ];
        assert_eq!(region_options(&all), vec!["Nyeri", "Kitengela"]);
    }

    #[test]
    fn pipeline_clamps_the_requested_page() {
        let all: Vec<Contract> = (0..12)
            .map(|i| Contract::new(format!("c{i:02}"), "Nyeri"))
            .collect();
        let query = ListQuery {
            page: 7,
            ..ListQuery::default()
        };
        let view = run_list_pipeline(&all, &query, 10);
        assert_eq!(view.page.page, 2);
        assert_eq!(view.page.total_pages, 2);
        assert_eq!(view.page.items.len(), 2);
        assert_eq!(view.sorted.len(), 12);
    }
}
