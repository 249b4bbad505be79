#![forbid(unsafe_code)]
//! BlockBima partner dashboard: session-gated, server-rendered views over the
//! contracts gateway.

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use bima_dash_gateway::{
    ContractGateway, HttpContractGateway, OpenMeteoArchive, WeatherArchive,
};
use bima_dash_query::ExplorerLinks;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

mod config;
mod http;
mod middleware;
mod session;

pub use config::{
    validate_startup_config, DashboardConfig, LoginCredentials, DEFAULT_LOGIN_PASSWORD,
    DEFAULT_LOGIN_USERNAME,
};
pub use http::api::{ApiError, ApiErrorCode};
pub use session::{
    AuthContext, ListState, LoadToken, LoadTokens, Session, SessionStore, SESSION_COOKIE,
};

pub const CRATE_NAME: &str = "bima-dash-server";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub gateway: Arc<dyn ContractGateway>,
    pub weather: Arc<dyn WeatherArchive>,
    pub sessions: Arc<SessionStore>,
    pub explorer: ExplorerLinks,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: Arc<dyn ContractGateway>, weather: Arc<dyn WeatherArchive>) -> Self {
        Self::with_config(DashboardConfig::default(), gateway, weather)
    }

    #[must_use]
    pub fn with_config(
        config: DashboardConfig,
        gateway: Arc<dyn ContractGateway>,
        weather: Arc<dyn WeatherArchive>,
    ) -> Self {
        Self {
            explorer: ExplorerLinks::new(config.explorer_url.clone()),
            sessions: Arc::new(SessionStore::new(
                config.session_idle_timeout,
                config.max_sessions,
            )),
            config: Arc::new(config),
            gateway,
            weather,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }

    /// State wired to the real gateway and weather archive.
    #[must_use]
    pub fn from_config(config: DashboardConfig) -> Self {
        let gateway = Arc::new(HttpContractGateway::new(config.gateway()));
        let weather = Arc::new(OpenMeteoArchive::new(config.weather()));
        Self::with_config(config, gateway, weather)
    }
}

pub fn build_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/dashboard", get(http::handlers::dashboard_handler))
        .route("/dashboard/reload", post(http::handlers::reload_handler))
        .route("/dashboard/export.csv", get(http::handlers::export_handler))
        .route("/contracts/:id", get(http::handlers::detail_handler))
        .route("/api/contracts", get(http::api::api_contracts_handler))
        .route("/api/contracts/:id", get(http::api::api_contract_handler))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::session_gate::session_gate_middleware,
        ));
    Router::new()
        .route("/", get(http::handlers::login_page_handler))
        .route("/login", post(http::handlers::login_submit_handler))
        .route("/logout", post(http::handlers::logout_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .merge(gated)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .with_state(state)
}
