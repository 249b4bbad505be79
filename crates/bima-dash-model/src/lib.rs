#![forbid(unsafe_code)]
//! Contract model for the BlockBima partner dashboard.
//!
//! Everything here is a read-only snapshot of what the contracts gateway
//! returns. Optional gateway fields decode to defaults instead of failing.

mod contract;
mod date;
mod region;
mod report;
mod serde_helpers;

pub use contract::{Beneficiary, Contract, ContractRegion, IndividualClaim, SettlementStatus};
pub use date::{format_calendar_date, parse_calendar_date, ParseError, INVALID_DATE_SENTINEL};
pub use region::{region_coordinates, Coordinates, DEFAULT_MAP_CENTER, REGION_COORDINATES};
pub use report::{DailyDatum, ReportInfo, WeatherLookup};

pub const CRATE_NAME: &str = "bima-dash-model";
