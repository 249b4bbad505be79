// SPDX-License-Identifier: Apache-2.0

use crate::date::parse_calendar_date;
use crate::region::{region_coordinates, Coordinates};
use crate::report::ReportInfo;
use crate::serde_helpers::{lenient_amount, null_as_default};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ContractRegion {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegionRepr {
    Named {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
    },
    Bare(String),
}

impl<'de> Deserialize<'de> for ContractRegion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = match Option::<RegionRepr>::deserialize(deserializer)? {
            None => String::new(),
            Some(RegionRepr::Named { name }) | Some(RegionRepr::Bare(name)) => name,
        };
        Ok(Self { name })
    }
}

impl ContractRegion {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        region_coordinates(&self.name)
    }
}

/// A payout recipient. Gateway variants send either a bare wallet address or
/// a `{name, phone, wallet}` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Beneficiary {
    Address(String),
    Record {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
        #[serde(default, deserialize_with = "null_as_default")]
        phone: String,
        #[serde(default, deserialize_with = "null_as_default")]
        wallet: String,
    },
}

impl Beneficiary {
    /// Case-sensitive substring match against every textual part of the entry.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Self::Address(addr) => addr.contains(needle),
            Self::Record {
                name,
                phone,
                wallet,
            } => name.contains(needle) || phone.contains(needle) || wallet.contains(needle),
        }
    }

    /// Value placed on the clipboard by the copy control.
    #[must_use]
    pub fn wallet(&self) -> &str {
        match self {
            Self::Address(addr) => addr,
            Self::Record { wallet, .. } => wallet,
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Address(addr) => addr.clone(),
            Self::Record {
                name,
                phone,
                wallet,
            } => {
                let mut parts = Vec::new();
                for part in [name, phone, wallet] {
                    if !part.is_empty() {
                        parts.push(part.as_str());
                    }
                }
                parts.join(" · ")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    Active,
    Settled,
}

impl SettlementStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Settled => "Settled",
        }
    }
}

impl Display for SettlementStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-beneficiary share of the total claim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndividualClaim {
    Amount(f64),
    NotApplicable,
}

impl Display for IndividualClaim {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Amount(v) => write!(f, "{v:.2}"),
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Contract {
    pub id: String,
    #[serde(default)]
    pub region: ContractRegion,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_premium: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_claim_amount: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_fulfilled: bool,
    #[serde(
        default,
        alias = "settlement_tx_id",
        alias = "settlement_transaction_hash",
        skip_serializing_if = "Option::is_none"
    )]
    pub settlement_tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_contract_address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub maturity_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub beneficiaries: Vec<Beneficiary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_info: Option<ReportInfo>,
}

impl Contract {
    #[must_use]
    pub fn new(id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            region: ContractRegion::new(region),
            total_premium: 0.0,
            total_claim_amount: 0.0,
            is_fulfilled: false,
            settlement_tx_hash: None,
            smart_contract_address: None,
            maturity_date: String::new(),
            created_at: String::new(),
            beneficiaries: Vec::new(),
            report_info: None,
        }
    }

    #[must_use]
    pub fn with_premium(mut self, premium: f64) -> Self {
        self.total_premium = premium;
        self
    }

    #[must_use]
    pub fn with_claim_amount(mut self, amount: f64) -> Self {
        self.total_claim_amount = amount;
        self
    }

    #[must_use]
    pub fn with_fulfilled(mut self, fulfilled: bool) -> Self {
        self.is_fulfilled = fulfilled;
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    #[must_use]
    pub fn with_maturity_date(mut self, maturity_date: impl Into<String>) -> Self {
        self.maturity_date = maturity_date.into();
        self
    }

    #[must_use]
    pub fn with_beneficiaries(mut self, beneficiaries: Vec<Beneficiary>) -> Self {
        self.beneficiaries = beneficiaries;
        self
    }

    #[must_use]
    pub fn with_settlement_tx_hash(mut self, hash: impl Into<String>) -> Self {
        self.settlement_tx_hash = Some(hash.into());
        self
    }

    #[must_use]
    pub fn with_smart_contract_address(mut self, address: impl Into<String>) -> Self {
        self.smart_contract_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_report_info(mut self, report: ReportInfo) -> Self {
        self.report_info = Some(report);
        self
    }

    #[must_use]
    pub fn beneficiary_count(&self) -> usize {
        self.beneficiaries.len()
    }

    #[must_use]
    pub fn status(&self) -> SettlementStatus {
        if self.is_fulfilled {
            SettlementStatus::Settled
        } else {
            SettlementStatus::Active
        }
    }

    #[must_use]
    pub fn created_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.created_at).ok()
    }

    #[must_use]
    pub fn individual_claim(&self) -> IndividualClaim {
        match self.beneficiaries.len() {
            0 => IndividualClaim::NotApplicable,
            n => IndividualClaim::Amount(self.total_claim_amount / n as f64),
        }
    }
}
