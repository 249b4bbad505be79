// SPDX-License-Identifier: Apache-2.0

use crate::error::{GatewayError, GatewayErrorCode};
use async_trait::async_trait;
use bima_dash_model::Contract;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use tracing::{instrument, warn};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const CONTRACTS_PATH: &str = "/blockbima-svc/v1/contracts";

#[async_trait]
pub trait ContractGateway: Send + Sync + 'static {
    /// Raw list body as the gateway sent it.
    async fn list_contracts_raw(&self) -> Result<Value, GatewayError>;

    /// Raw single-contract body as the gateway sent it.
    async fn contract_raw(&self, id: &str) -> Result<Value, GatewayError>;

    /// Decoded list. A body without a `contracts` array is an empty list;
    /// individual entries that do not decode are dropped with a warning.
    async fn list_contracts(&self) -> Result<Vec<Contract>, GatewayError> {
        let body = self.list_contracts_raw().await?;
        Ok(decode_contract_list(body))
    }

    async fn get_contract(&self, id: &str) -> Result<Contract, GatewayError> {
        let body = self.contract_raw(id).await?;
        serde_json::from_value(body).map_err(GatewayError::decode)
    }
}

#[must_use]
pub fn decode_contract_list(body: Value) -> Vec<Contract> {
    let Some(Value::Array(items)) = body.get("contracts").cloned() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Contract>(item) {
            Ok(c) => out.push(c),
            Err(e) => warn!(index = idx, error = %e, "dropping undecodable contract"),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct HttpContractGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl HttpContractGateway {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    fn list_url(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            CONTRACTS_PATH
        )
    }

    fn contract_url(&self, id: &str) -> Result<String, GatewayError> {
        let mut url = reqwest::Url::parse(&self.list_url()).map_err(|e| {
            GatewayError::new(GatewayErrorCode::Config, format!("invalid gateway url: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                GatewayError::new(GatewayErrorCode::Config, "gateway url cannot be a base")
            })?
            .push(id);
        Ok(url.into())
    }

    fn headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.config.api_key).map_err(|e| {
            GatewayError::new(GatewayErrorCode::Config, format!("invalid api key header: {e}"))
        })?;
        headers.insert(API_KEY_HEADER, key);
        Ok(headers)
    }

    async fn get_json(&self, url: &str) -> Result<Value, GatewayError> {
        let resp = self
            .client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| GatewayError::transport(&e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::status(status.as_u16(), url));
        }
        resp.json::<Value>().await.map_err(GatewayError::decode)
    }
}

#[async_trait]
impl ContractGateway for HttpContractGateway {
    #[instrument(name = "gateway_list_contracts", skip(self))]
    async fn list_contracts_raw(&self) -> Result<Value, GatewayError> {
        self.get_json(&self.list_url()).await
    }

    #[instrument(name = "gateway_get_contract", skip(self))]
    async fn contract_raw(&self, id: &str) -> Result<Value, GatewayError> {
        let url = self.contract_url(id)?;
        self.get_json(&url).await
    }
}
