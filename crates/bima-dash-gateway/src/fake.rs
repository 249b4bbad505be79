// SPDX-License-Identifier: Apache-2.0

use crate::contracts::ContractGateway;
use crate::error::{GatewayError, GatewayErrorCode};
use crate::weather::WeatherArchive;
use async_trait::async_trait;
use bima_dash_model::{Coordinates, WeatherLookup};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// In-memory gateway and weather archive for tests and local demos.
pub struct FakeGateway {
    pub contracts: Mutex<Vec<Value>>,
    pub weather: Mutex<WeatherLookup>,
    pub fail_list: AtomicBool,
    pub fail_detail: AtomicBool,
    pub fail_weather: AtomicBool,
    pub list_calls: AtomicU64,
    pub detail_calls: AtomicU64,
    pub weather_calls: AtomicU64,
    pub weather_delay: Duration,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            contracts: Mutex::new(Vec::new()),
            weather: Mutex::new(WeatherLookup::new()),
            fail_list: AtomicBool::new(false),
            fail_detail: AtomicBool::new(false),
            fail_weather: AtomicBool::new(false),
            list_calls: AtomicU64::new(0),
            detail_calls: AtomicU64::new(0),
            weather_calls: AtomicU64::new(0),
            weather_delay: Duration::from_millis(0),
        }
    }
}

impl FakeGateway {
    #[must_use]
    pub fn with_contracts(contracts: Vec<Value>) -> Self {
        Self {
            contracts: Mutex::new(contracts),
            ..Self::default()
        }
    }
}

fn unavailable() -> GatewayError {
    GatewayError::status(503, "fake://gateway")
}

#[async_trait]
impl ContractGateway for FakeGateway {
    async fn list_contracts_raw(&self) -> Result<Value, GatewayError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_list.load(Ordering::Relaxed) {
            return Err(unavailable());
        }
        Ok(json!({ "contracts": self.contracts.lock().await.clone() }))
    }

    async fn contract_raw(&self, id: &str) -> Result<Value, GatewayError> {
        self.detail_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_detail.load(Ordering::Relaxed) {
            return Err(unavailable());
        }
        self.contracts
            .lock()
            .await
            .iter()
            .find(|c| c.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
            .ok_or_else(|| GatewayError::status(404, "fake://gateway"))
    }
}

#[async_trait]
impl WeatherArchive for FakeGateway {
    async fn daily_precipitation(
        &self,
        _coords: Coordinates,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<WeatherLookup, GatewayError> {
        self.weather_calls.fetch_add(1, Ordering::Relaxed);
        if !self.weather_delay.is_zero() {
            tokio::time::sleep(self.weather_delay).await;
        }
        if self.fail_weather.load(Ordering::Relaxed) {
            return Err(GatewayError::new(
                GatewayErrorCode::Transport,
                "fake weather archive offline",
            ));
        }
        Ok(self.weather.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_serves_and_fails_on_demand() {
        let fake =
            FakeGateway::with_contracts(vec![json!({"id": "A", "region": {"name": "Nyeri"}})]);
        let all = fake.list_contracts().await.expect("list");
        assert_eq!(all.len(), 1);
        let one = fake.get_contract("A").await.expect("detail");
        assert_eq!(one.region.name, "Nyeri");
        let missing = fake.get_contract("Z").await.expect_err("missing");
        assert_eq!(missing.status, Some(404));

        fake.fail_list.store(true, Ordering::Relaxed);
        assert!(fake.list_contracts().await.is_err());
        assert_eq!(fake.list_calls.load(Ordering::Relaxed), 2);
    }
}
