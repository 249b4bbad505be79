// SPDX-License-Identifier: Apache-2.0

use crate::http::api::{api_error_response, ApiError, ApiErrorCode};
use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;
use tracing::debug;

pub(crate) const LOGIN_PATH: &str = "/";

/// Admits only authenticated sessions. The session is handed to handlers
/// as an `Extension<Arc<Session>>`.
pub(crate) async fn session_gate_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let session = state.sessions.from_headers(request.headers()).await;
    match session {
        Some(session) if session.auth.is_authenticated() => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        _ => {
            let path = request.uri().path();
            debug!(route = %path, "unauthenticated request");
            if path.starts_with("/api/") {
                api_error_response(
                    StatusCode::UNAUTHORIZED,
                    ApiError::new(
                        ApiErrorCode::Unauthenticated,
                        "login required",
                        json!({}),
                    ),
                )
            } else {
                Redirect::to(LOGIN_PATH).into_response()
            }
        }
    }
}
