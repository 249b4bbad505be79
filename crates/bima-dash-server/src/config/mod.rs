// SPDX-License-Identifier: Apache-2.0

use bima_dash_gateway::{GatewayConfig, WeatherConfig};
use bima_dash_query::{DEFAULT_BENEFICIARY_PAGE_SIZE, DEFAULT_LIST_PAGE_SIZE};
use chrono::NaiveDate;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_LOGIN_USERNAME: &str = "partner";
pub const DEFAULT_LOGIN_PASSWORD: &str = "secure123";

#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Default for LoginCredentials {
    fn default() -> Self {
        Self {
            username: DEFAULT_LOGIN_USERNAME.to_string(),
            password: DEFAULT_LOGIN_PASSWORD.to_string(),
        }
    }
}

impl LoginCredentials {
    #[must_use]
    pub fn accepts(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardConfig {
    pub gateway_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub weather_url: String,
    pub weather_timezone: String,
    pub explorer_url: String,
    pub list_page_size: usize,
    pub beneficiary_page_size: usize,
    /// When set, contracts created before this date are hidden from the list.
    pub created_cutoff: Option<NaiveDate>,
    pub login: LoginCredentials,
    pub upstream_timeout: Duration,
    pub max_body_bytes: usize,
    /// Sessions unused for this long are dropped.
    pub session_idle_timeout: Duration,
    pub max_sessions: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let weather = WeatherConfig::default();
        Self {
            gateway_url: GatewayConfig::default().base_url,
            api_key: String::new(),
            weather_url: weather.base_url,
            weather_timezone: weather.timezone,
            explorer_url: "https://sepolia.etherscan.io".to_string(),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            beneficiary_page_size: DEFAULT_BENEFICIARY_PAGE_SIZE,
            created_cutoff: None,
            login: LoginCredentials::default(),
            upstream_timeout: Duration::from_secs(10),
            max_body_bytes: 16 * 1024,
            session_idle_timeout: Duration::from_secs(30 * 60),
            max_sessions: 1024,
        }
    }
}

impl DashboardConfig {
    #[must_use]
    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.gateway_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.upstream_timeout,
        }
    }

    #[must_use]
    pub fn weather(&self) -> WeatherConfig {
        WeatherConfig {
            base_url: self.weather_url.clone(),
            timezone: self.weather_timezone.clone(),
            timeout: self.upstream_timeout,
        }
    }
}

pub fn validate_startup_config(cfg: &DashboardConfig) -> Result<(), String> {
    if cfg.list_page_size == 0 || cfg.beneficiary_page_size == 0 {
        return Err("page sizes must be > 0".to_string());
    }
    if cfg.gateway_url.trim().is_empty() {
        return Err("GATEWAY_URL must not be empty".to_string());
    }
    if cfg.login.username.is_empty() || cfg.login.password.is_empty() {
        return Err("login credentials must not be empty".to_string());
    }
    if cfg.upstream_timeout.is_zero() {
        return Err("upstream timeout must be > 0".to_string());
    }
    if cfg.max_body_bytes == 0 {
        return Err("max body bytes must be > 0".to_string());
    }
    if cfg.session_idle_timeout.is_zero() || cfg.max_sessions == 0 {
        return Err("session idle timeout and max sessions must be > 0".to_string());
    }
    Ok(())
}
