// SPDX-License-Identifier: Apache-2.0

use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bima_dash_gateway::{GatewayError, GatewayErrorCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ApiErrorCode {
    UpstreamUnavailable,
    UpstreamStatus,
    UpstreamDecode,
    Unauthenticated,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }
}

impl From<&GatewayError> for ApiError {
    fn from(err: &GatewayError) -> Self {
        let code = match err.code {
            GatewayErrorCode::Transport => ApiErrorCode::UpstreamUnavailable,
            GatewayErrorCode::Status => ApiErrorCode::UpstreamStatus,
            GatewayErrorCode::Decode => ApiErrorCode::UpstreamDecode,
            _ => ApiErrorCode::Internal,
        };
        let details = match err.status {
            Some(status) => json!({"upstream_status": status}),
            None => json!({}),
        };
        Self::new(code, err.message.clone(), details)
    }
}

pub(crate) fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    (status, Json(json!({"error": err}))).into_response()
}

fn upstream_failure(err: &GatewayError) -> Response {
    warn!(error = %err, "gateway proxy request failed");
    api_error_response(StatusCode::BAD_GATEWAY, ApiError::from(err))
}

/// Pass-through of the gateway contract list.
pub(crate) async fn api_contracts_handler(State(state): State<AppState>) -> Response {
    match state.gateway.list_contracts_raw().await {
        Ok(body) => Json(body).into_response(),
        Err(e) => upstream_failure(&e),
    }
}

/// Pass-through of one gateway contract.
pub(crate) async fn api_contract_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.gateway.contract_raw(&id).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => upstream_failure(&e),
    }
}
