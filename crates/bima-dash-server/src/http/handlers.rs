// SPDX-License-Identifier: Apache-2.0

use crate::http::html::html_response;
use crate::http::pages::{self, DashboardModel, DetailModel};
use crate::middleware::session_gate::LOGIN_PATH;
use crate::session::{expired_session_cookie, session_cookie, Session};
use crate::AppState;
use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use bima_dash_model::{Contract, WeatherLookup};
use bima_dash_query::{
    export_csv, infographics, map_center, map_markers, region_options, render_detail,
    run_list_pipeline, ContractFilter, DetailRequest, ListQuery, SortDirection, SortKey,
    SortState, EXPORT_FILENAME,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

pub(crate) const LIST_VIEW: &str = "list";
const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    q: Option<String>,
    region: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
    page: Option<String>,
}

impl ListParams {
    fn to_query(&self, created_cutoff: Option<NaiveDate>) -> ListQuery {
        let fallback = SortState::default();
        let key = self
            .sort
            .as_deref()
            .and_then(SortKey::parse)
            .unwrap_or(fallback.key);
        let direction = self
            .dir
            .as_deref()
            .and_then(SortDirection::parse)
            .unwrap_or(fallback.direction);
        ListQuery {
            filter: ContractFilter {
                search_term: self.q.clone().unwrap_or_default(),
                region: self.region.clone().unwrap_or_default(),
                created_cutoff,
            },
            sort: SortState::new(key, direction),
            page: parse_number(self.page.as_deref(), 1),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DetailParams {
    bpage: Option<String>,
    field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Lenient numeric query value: anything unparseable falls back to `default`.
fn parse_number(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn with_cookie(mut resp: Response, cookie: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        resp.headers_mut().insert("set-cookie", value);
    }
    resp
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn login_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    match state.sessions.from_headers(&headers).await {
        Some(session) if session.auth.is_authenticated() => {
            Redirect::to(DASHBOARD_PATH).into_response()
        }
        _ => html_response(StatusCode::OK, pages::login_page(None)),
    }
}

pub(crate) async fn login_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let session = match state.sessions.from_headers(&headers).await {
        Some(existing) => existing,
        None => Arc::new(Session::new()),
    };
    if !session
        .auth
        .login(&state.config.login, &form.username, &form.password)
    {
        warn!(username = %form.username, "login rejected");
        return html_response(
            StatusCode::UNAUTHORIZED,
            pages::login_page(Some("Invalid credentials")),
        );
    }
    state.sessions.insert(Arc::clone(&session)).await;
    let live_sessions = state.sessions.len().await;
    info!(
        username = %form.username,
        live_sessions,
        "partner logged in"
    );
    with_cookie(
        Redirect::to(DASHBOARD_PATH).into_response(),
        &session_cookie(&session.id),
    )
}

pub(crate) async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session) = state.sessions.from_headers(&headers).await {
        session.auth.logout();
        state.sessions.remove(&session.id).await;
        info!("partner logged out");
    }
    with_cookie(
        Redirect::to(LOGIN_PATH).into_response(),
        &expired_session_cookie(),
    )
}

/// Re-fetches the contract list for `session`. A failed fetch empties the
/// collection; a superseded fetch is dropped.
pub(crate) async fn load_contract_list(state: &AppState, session: &Session) {
    let token = session.tokens.begin(LIST_VIEW).await;
    let fetched = state.gateway.list_contracts().await;
    let mut list = session.list.lock().await;
    if !session.tokens.finish(&token).await {
        info!("discarding superseded contract list load");
        return;
    }
    match fetched {
        Ok(contracts) => {
            info!(count = contracts.len(), "contract list loaded");
            list.contracts = contracts;
            list.last_fetched = Some(Utc::now());
        }
        Err(e) => {
            warn!(error = %e, "contract list load failed");
            list.contracts.clear();
        }
    }
    list.loaded = true;
}

async fn ensure_list_loaded(state: &AppState, session: &Session) {
    let loaded = session.list.lock().await.loaded;
    if !loaded {
        load_contract_list(state, session).await;
    }
}

pub(crate) async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Query(params): Query<ListParams>,
) -> Response {
    ensure_list_loaded(&state, &session).await;
    let list = session.list.lock().await;
    let query = params.to_query(state.config.created_cutoff);
    let view = run_list_pipeline(&list.contracts, &query, state.config.list_page_size);
    let regions = region_options(&list.contracts);
    let markers = map_markers(&view.filtered);
    let html = pages::dashboard_page(&DashboardModel {
        query: &query,
        view: &view,
        regions: &regions,
        last_fetched: list.last_fetched,
        infographics: infographics(&view.filtered),
        markers: &markers,
        center: map_center(&markers),
    });
    html_response(StatusCode::OK, html)
}

pub(crate) async fn reload_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Query(params): Query<ListParams>,
) -> Response {
    load_contract_list(&state, &session).await;
    let query = params.to_query(state.config.created_cutoff);
    Redirect::to(&pages::dashboard_href(&query, query.page)).into_response()
}

pub(crate) async fn export_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Query(params): Query<ListParams>,
) -> Response {
    ensure_list_loaded(&state, &session).await;
    let list = session.list.lock().await;
    let query = params.to_query(state.config.created_cutoff);
    let view = run_list_pipeline(&list.contracts, &query, state.config.list_page_size);
    match export_csv(&view.sorted) {
        Ok(bytes) => {
            let mut resp = (StatusCode::OK, bytes).into_response();
            let headers = resp.headers_mut();
            headers.insert(
                "content-type",
                HeaderValue::from_static("text/csv; charset=utf-8"),
            );
            if let Ok(v) =
                HeaderValue::from_str(&format!("attachment; filename=\"{EXPORT_FILENAME}\""))
            {
                headers.insert("content-disposition", v);
            }
            resp
        }
        Err(e) => {
            error!(error = %e, "csv export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn weather_view(contract_id: &str) -> String {
    format!("weather:{contract_id}")
}

/// Starts the background precipitation load for `contract` when it has a
/// report, a known region and nothing cached yet. Returns `true` while a
/// load for this contract is running.
async fn ensure_weather(state: &AppState, session: &Arc<Session>, contract: &Contract) -> bool {
    let Some((start, end)) = contract
        .report_info
        .as_ref()
        .and_then(|r| r.date_range())
    else {
        return false;
    };
    let Some(coords) = contract.region.coordinates() else {
        return false;
    };
    // Held across `try_begin`: the loader inserts under this lock, so a
    // finished load is always visible here.
    let cache = session.weather.lock().await;
    if cache.contains_key(&contract.id) {
        return false;
    }
    let Some(token) = session.tokens.try_begin(&weather_view(&contract.id)).await else {
        return true;
    };
    drop(cache);

    let archive = Arc::clone(&state.weather);
    let session = Arc::clone(session);
    let id = contract.id.clone();
    let span = tracing::info_span!("weather.load", contract_id = %id);
    tokio::spawn(
        async move {
            let lookup = match archive.daily_precipitation(coords, start, end).await {
                Ok(lookup) => {
                    info!(days = lookup.len(), "weather loaded");
                    lookup
                }
                Err(e) => {
                    warn!(error = %e, "weather load failed");
                    WeatherLookup::new()
                }
            };
            let mut cache = session.weather.lock().await;
            if session.tokens.finish(&token).await {
                cache.insert(id, lookup);
            }
        }
        .instrument(span),
    );
    true
}

pub(crate) async fn detail_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<String>,
    Query(params): Query<DetailParams>,
) -> Response {
    let request = DetailRequest {
        beneficiary_page: parse_number(params.bpage.as_deref(), 1),
        field_cursor: parse_number(params.field.as_deref(), 0),
        beneficiary_page_size: state.config.beneficiary_page_size,
    };
    let contract = match state.gateway.get_contract(&id).await {
        Ok(contract) => contract,
        Err(e) => {
            warn!(contract_id = %id, error = %e, "contract load failed");
            let retry = pages::detail_href(&id, request.beneficiary_page, request.field_cursor);
            return html_response(
                StatusCode::BAD_GATEWAY,
                pages::detail_error_page(&id, &e.to_string(), &retry),
            );
        }
    };
    let weather_pending = ensure_weather(&state, &session, &contract).await;
    let cached = session.weather.lock().await.get(&contract.id).cloned();
    let detail = render_detail(&contract, cached.as_ref(), &request, &state.explorer);
    html_response(
        StatusCode::OK,
        pages::detail_page(&DetailModel {
            detail: &detail,
            weather_pending,
        }),
    )
}
