// SPDX-License-Identifier: Apache-2.0

use crate::page::Page;
use bima_dash_model::{
    format_calendar_date, Beneficiary, Contract, IndividualClaim, ReportInfo, WeatherLookup,
};
use serde::Serialize;
use std::fmt::{Display, Formatter};

pub const DEFAULT_BENEFICIARY_PAGE_SIZE: usize = 5;
pub const PENDING_PLACEHOLDER: &str = "pending";

/// Builds outbound block-explorer links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerLinks {
    base_url: String,
}

impl ExplorerLinks {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{hash}", self.base_url)
    }

    #[must_use]
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{address}", self.base_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    Text { text: String },
    Link { text: String, href: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    pub name: &'static str,
    pub value: FieldValue,
}

type FieldFormatter = fn(&Contract, &ExplorerLinks) -> Option<FieldValue>;

fn dump<T: Serialize + ?Sized>(value: &T) -> FieldValue {
    FieldValue::Text {
        text: serde_json::to_string(value).unwrap_or_else(|_| "null".to_string()),
    }
}

fn id_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    Some(dump(&c.id))
}

fn region_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    Some(dump(&c.region))
}

fn premium_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    Some(dump(&c.total_premium))
}

fn claim_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    Some(dump(&c.total_claim_amount))
}

fn fulfilled_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    Some(dump(&c.is_fulfilled))
}

fn settlement_field(c: &Contract, links: &ExplorerLinks) -> Option<FieldValue> {
    c.settlement_tx_hash.as_ref().map(|hash| FieldValue::Link {
        text: hash.clone(),
        href: links.tx_url(hash),
    })
}

fn smart_contract_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    c.smart_contract_address.as_deref().map(dump)
}

fn maturity_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    Some(dump(&c.maturity_date))
}

fn created_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    Some(dump(&c.created_at))
}

fn beneficiaries_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    Some(dump(&c.beneficiaries))
}

fn report_field(c: &Contract, _: &ExplorerLinks) -> Option<FieldValue> {
    c.report_info.as_ref().map(dump)
}

/// Browser order. `None` from a formatter drops the field.
const FIELD_SCHEMA: &[(&str, FieldFormatter)] = &[
    ("id", id_field),
    ("region", region_field),
    ("total_premium", premium_field),
    ("total_claim_amount", claim_field),
    ("is_fulfilled", fulfilled_field),
    ("settlement_tx_hash", settlement_field),
    ("smart_contract_address", smart_contract_field),
    ("maturity_date", maturity_field),
    ("created_at", created_field),
    ("beneficiaries", beneficiaries_field),
    ("report_info", report_field),
];

/// Field-by-field view of one contract with a clamped cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldBrowser {
    entries: Vec<FieldEntry>,
    cursor: usize,
}

impl FieldBrowser {
    #[must_use]
    pub fn new(contract: &Contract, links: &ExplorerLinks) -> Self {
        let entries = FIELD_SCHEMA
            .iter()
            .filter_map(|&(name, fmt)| {
                fmt(contract, links).map(|value| FieldEntry { name, value })
            })
            .collect();
        Self { entries, cursor: 0 }
    }

    /// Positions the cursor, clamping into `[0, len-1]`.
    #[must_use]
    pub fn at(mut self, cursor: usize) -> Self {
        self.cursor = cursor.min(self.entries.len().saturating_sub(1));
        self
    }

    pub fn next(&mut self) {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
    }

    pub fn prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn current(&self) -> Option<&FieldEntry> {
        self.entries.get(self.cursor)
    }

    #[must_use]
    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "mm", rename_all = "snake_case")]
pub enum Precipitation {
    Pending,
    Millimetres(f64),
}

impl Display for Precipitation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str(PENDING_PLACEHOLDER),
            Self::Millimetres(mm) => write!(f, "{mm:.1} mm"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReportRow {
    pub date: String,
    pub reported_value: String,
    pub calculated_payout: String,
    pub precipitation: Precipitation,
}

/// Exact date-string join. A miss is `Pending`, never zero.
#[must_use]
pub fn join_weather(report: &ReportInfo, lookup: Option<&WeatherLookup>) -> Vec<DailyReportRow> {
    report
        .daily_data
        .iter()
        .map(|d| DailyReportRow {
            date: d.date.clone(),
            reported_value: d.reported_value.clone(),
            calculated_payout: d.calculated_payout.clone(),
            precipitation: lookup
                .and_then(|l| l.get(&d.date))
                .map_or(Precipitation::Pending, Precipitation::Millimetres),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailRequest {
    pub beneficiary_page: usize,
    pub field_cursor: usize,
    pub beneficiary_page_size: usize,
}

impl Default for DetailRequest {
    fn default() -> Self {
        Self {
            beneficiary_page: 1,
            field_cursor: 0,
            beneficiary_page_size: DEFAULT_BENEFICIARY_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDetail {
    pub id: String,
    pub region: String,
    pub total_premium: f64,
    pub total_claim_amount: f64,
    pub status: &'static str,
    pub maturity_date: String,
    pub smart_contract: Option<FieldValue>,
    pub individual_claim: IndividualClaim,
    pub beneficiaries: Page<Beneficiary>,
    pub fields: FieldBrowser,
    /// `None` when the contract carries no report block.
    pub daily_rows: Option<Vec<DailyReportRow>>,
}

#[must_use]
pub fn render_detail(
    contract: &Contract,
    weather: Option<&WeatherLookup>,
    request: &DetailRequest,
    links: &ExplorerLinks,
) -> ContractDetail {
    ContractDetail {
        id: contract.id.clone(),
        region: contract.region.name.clone(),
        total_premium: contract.total_premium,
        total_claim_amount: contract.total_claim_amount,
        status: contract.status().as_str(),
        maturity_date: format_calendar_date(&contract.maturity_date),
        smart_contract: contract
            .smart_contract_address
            .as_ref()
            .map(|addr| FieldValue::Link {
                text: addr.clone(),
                href: links.address_url(addr),
            }),
        individual_claim: contract.individual_claim(),
        beneficiaries: Page::clamped(
            &contract.beneficiaries,
            request.beneficiary_page,
            request.beneficiary_page_size,
        ),
        fields: FieldBrowser::new(contract, links).at(request.field_cursor),
        daily_rows: contract
            .report_info
            .as_ref()
            .map(|report| join_weather(report, weather)),
    }
}
