#![forbid(unsafe_code)]

use bima_dash_model::parse_calendar_date;
use bima_dash_server::{
    build_router, validate_startup_config, AppState, DashboardConfig, LoginCredentials,
};
use std::env;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("DASH_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn config_from_env() -> Result<DashboardConfig, String> {
    let defaults = DashboardConfig::default();
    let created_cutoff = match env::var("DASH_CREATED_CUTOFF") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            parse_calendar_date(&raw)
                .map_err(|e| format!("invalid DASH_CREATED_CUTOFF {raw}: {e}"))?,
        ),
        _ => None,
    };
    Ok(DashboardConfig {
        gateway_url: env_string("GATEWAY_URL", &defaults.gateway_url),
        api_key: env_string("BLOCKBIMA_API_KEY", ""),
        weather_url: env_string("DASH_WEATHER_URL", &defaults.weather_url),
        weather_timezone: env_string("DASH_WEATHER_TIMEZONE", &defaults.weather_timezone),
        explorer_url: env_string("DASH_EXPLORER_URL", &defaults.explorer_url),
        list_page_size: env_usize("DASH_LIST_PAGE_SIZE", defaults.list_page_size),
        beneficiary_page_size: env_usize(
            "DASH_BENEFICIARY_PAGE_SIZE",
            defaults.beneficiary_page_size,
        ),
        created_cutoff,
        login: LoginCredentials {
            username: env_string("DASH_LOGIN_USERNAME", &defaults.login.username),
            password: env_string("DASH_LOGIN_PASSWORD", &defaults.login.password),
        },
        upstream_timeout: Duration::from_millis(env_u64("DASH_UPSTREAM_TIMEOUT_MS", 10_000)),
        max_body_bytes: env_usize("DASH_MAX_BODY_BYTES", defaults.max_body_bytes),
        session_idle_timeout: Duration::from_secs(env_u64(
            "DASH_SESSION_IDLE_SECS",
            defaults.session_idle_timeout.as_secs(),
        )),
        max_sessions: env_usize("DASH_MAX_SESSIONS", defaults.max_sessions),
    })
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env_string("DASH_BIND_ADDR", "0.0.0.0:3000");
    let config = config_from_env()?;
    validate_startup_config(&config)?;
    if config.api_key.is_empty() {
        tracing::warn!("BLOCKBIMA_API_KEY is empty; gateway calls will likely be rejected");
    }
    info!(
        gateway = %config.gateway_url,
        cutoff = ?config.created_cutoff,
        "dashboard configuration loaded"
    );

    let app = build_router(AppState::from_config(config));
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("bima-dash-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
