#![forbid(unsafe_code)]
//! Outbound clients: the contracts gateway and the public weather archive.

mod contracts;
mod error;
mod fake;
mod weather;

pub use contracts::{
    decode_contract_list, ContractGateway, GatewayConfig, HttpContractGateway, API_KEY_HEADER,
    CONTRACTS_PATH,
};
pub use error::{GatewayError, GatewayErrorCode};
pub use fake::FakeGateway;
pub use weather::{OpenMeteoArchive, WeatherArchive, WeatherConfig, ARCHIVE_PATH, DAILY_VARIABLE};

pub const CRATE_NAME: &str = "bima-dash-gateway";
