// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use bima_dash_gateway::FakeGateway;
use bima_dash_server::{build_router, AppState, DashboardConfig};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn fixture_contracts() -> Vec<Value> {
    vec![
        json!({
            "id": "A",
            "region": {"name": "Nyeri"},
            "total_premium": 100,
            "total_claim_amount": 50,
            "is_fulfilled": false,
            "created_at": "2025-06-25T09:00:00Z",
            "maturity_date": "2025-09-01",
            "beneficiaries": ["0xa1", "0xa2"],
            "report_info": {"daily_data": [
                {"date": "2025-07-01", "reported_value": 12, "calculated_payout": 0},
                {"date": "2025-07-02", "reported_value": 3, "calculated_payout": 5}
            ]}
        }),
        json!({
            "id": "B",
            "region": {"name": "Kitengela"},
            "total_premium": 50,
            "total_claim_amount": 0,
            "is_fulfilled": true,
            "created_at": "2025-06-20",
            "beneficiaries": ["0xb1"]
        }),
        json!({
            "id": "C",
            "region": {"name": "Nyeri"},
            "total_premium": 300,
            "total_claim_amount": 70,
            "created_at": "2025-06-30",
            "smart_contract_address": "0xc0ffee",
            "beneficiaries": ["0xc1", "0xc2", "0xc3", "0xc4", "0xc5", "0xc6", "0xc7"]
        }),
        json!({
            "id": "Z",
            "region": {"name": "Atlantis"},
            "total_premium": 1,
            "created_at": "2025-07-01",
            "beneficiaries": []
        }),
    ]
}

async fn spawn_app(fake: Arc<FakeGateway>, config: DashboardConfig) -> std::net::SocketAddr {
    let state = AppState::with_config(config, fake.clone(), fake);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    if !body.is_empty() || method == "POST" {
        req.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    req.push_str("\r\n");
    req.push_str(body);
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (k, v) = line.split_once(':')?;
        k.trim().eq_ignore_ascii_case(name).then_some(v.trim())
    })
}

const FORM: (&str, &str) = ("Content-Type", "application/x-www-form-urlencoded");

/// Logs in and returns the `Cookie` header value for the new session.
async fn login(addr: std::net::SocketAddr) -> String {
    let (status, head, _) = send_raw(
        addr,
        "POST",
        "/login",
        &[FORM],
        "username=partner&password=secure123",
    )
    .await;
    assert_eq!(status, 303);
    assert_eq!(header(&head, "location"), Some("/dashboard"));
    let set_cookie = header(&head, "set-cookie").expect("session cookie");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

async fn get(addr: std::net::SocketAddr, path: &str, cookie: &str) -> (u16, String, String) {
    send_raw(addr, "GET", path, &[("Cookie", cookie)], "").await
}

#[tokio::test]
async fn navigation_rules_follow_the_auth_flag() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let addr = spawn_app(fake, DashboardConfig::default()).await;

    let (status, head, _) = send_raw(addr, "GET", "/dashboard", &[], "").await;
    assert_eq!(status, 303);
    assert_eq!(header(&head, "location"), Some("/"));

    let (status, _, body) = send_raw(addr, "GET", "/contracts/A", &[], "").await;
    assert_eq!(status, 303);
    assert!(body.is_empty());

    let (status, _, body) = send_raw(addr, "GET", "/", &[], "").await;
    assert_eq!(status, 200);
    assert!(body.contains("Partner Login"));

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/login",
        &[FORM],
        "username=partner&password=wrong",
    )
    .await;
    assert_eq!(status, 401);
    assert!(body.contains("Invalid credentials"));

    let cookie = login(addr).await;
    let (status, head, _) = get(addr, "/", &cookie).await;
    assert_eq!(status, 303);
    assert_eq!(header(&head, "location"), Some("/dashboard"));

    let (status, _, body) = get(addr, "/dashboard", &cookie).await;
    assert_eq!(status, 200);
    assert!(body.contains("action=\"/logout\""));

    let (status, head, _) = send_raw(addr, "POST", "/logout", &[("Cookie", &cookie)], "").await;
    assert_eq!(status, 303);
    assert_eq!(header(&head, "location"), Some("/"));
    assert!(header(&head, "set-cookie").is_some_and(|c| c.contains("Max-Age=0")));

    let (status, head, _) = get(addr, "/dashboard", &cookie).await;
    assert_eq!(status, 303);
    assert_eq!(header(&head, "location"), Some("/"));
}

#[tokio::test]
async fn dashboard_filters_sorts_and_loads_once() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let addr = spawn_app(fake.clone(), DashboardConfig::default()).await;
    let cookie = login(addr).await;

    let (status, _, body) = get(addr, "/dashboard?region=Nyeri&sort=premium&dir=desc", &cookie).await;
    assert_eq!(status, 200);
    let c = body.find("/contracts/C").expect("C listed");
    let a = body.find("/contracts/A").expect("A listed");
    assert!(c < a, "premium desc puts C first");
    assert!(!body.contains("/contracts/B\""));
    assert!(body.contains("Last updated:"));
    // Infographics follow the filter: 2 + 7 beneficiaries in Nyeri.
    assert!(body.contains("<h4>Total Beneficiaries</h4><p>9</p>"));
    assert!(body.contains("<h4>Total Premium</h4><p>400.00</p>"));

    let (_, _, body) = get(addr, "/dashboard?q=0xb1", &cookie).await;
    assert!(body.contains("/contracts/B\""));
    assert!(!body.contains("/contracts/A\""));

    assert_eq!(fake.list_calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn created_cutoff_hides_older_contracts() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let config = DashboardConfig {
        created_cutoff: chrono::NaiveDate::from_ymd_opt(2025, 6, 24),
        ..DashboardConfig::default()
    };
    let addr = spawn_app(fake, config).await;
    let cookie = login(addr).await;
    let (_, _, body) = get(addr, "/dashboard", &cookie).await;
    assert!(body.contains("/contracts/A\""));
    assert!(!body.contains("/contracts/B\""));
}

#[tokio::test]
async fn pagination_clamps_out_of_range_pages() {
    let contracts: Vec<Value> = (1..=12)
        .map(|i| {
            json!({
                "id": format!("P{i:02}"),
                "region": {"name": "Marikiti"},
                "created_at": format!("2025-07-{i:02}"),
                "beneficiaries": ["w"]
            })
        })
        .collect();
    let fake = Arc::new(FakeGateway::with_contracts(contracts));
    let addr = spawn_app(fake, DashboardConfig::default()).await;
    let cookie = login(addr).await;

    let (_, _, body) = get(addr, "/dashboard", &cookie).await;
    assert!(body.contains("Page 1 of 2"));
    assert!(body.contains("/contracts/P10\""));
    assert!(!body.contains("/contracts/P11\""));

    let (_, _, body) = get(addr, "/dashboard?page=99", &cookie).await;
    assert!(body.contains("Page 2 of 2"));
    assert!(body.contains("/contracts/P12\""));
    assert!(!body.contains("/contracts/P01\""));

    let (status, head, body) = get(addr, "/dashboard/export.csv", &cookie).await;
    assert_eq!(status, 200);
    assert!(header(&head, "content-disposition").is_some_and(|v| v.contains("contracts.csv")));
    assert_eq!(body.lines().count(), 13, "header plus every filtered row");
    assert!(body.starts_with("id,region,beneficiaries,premium,payout,status,created_at"));
}

#[tokio::test]
async fn export_honours_filter_and_sort() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let addr = spawn_app(fake, DashboardConfig::default()).await;
    let cookie = login(addr).await;
    let (status, head, body) = get(
        addr,
        "/dashboard/export.csv?region=Nyeri&sort=premium&dir=desc",
        &cookie,
    )
    .await;
    assert_eq!(status, 200);
    assert!(header(&head, "content-type").is_some_and(|v| v.starts_with("text/csv")));
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(
        lines,
        vec![
            "id,region,beneficiaries,premium,payout,status,created_at",
            "C,Nyeri,7,300,70,Active,2025-06-30",
            "A,Nyeri,2,100,50,Active,2025-06-25",
        ]
    );
}

#[tokio::test]
async fn reload_fails_soft_to_an_empty_list() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let addr = spawn_app(fake.clone(), DashboardConfig::default()).await;
    let cookie = login(addr).await;

    let (_, _, body) = get(addr, "/dashboard", &cookie).await;
    assert!(body.contains("/contracts/A\""));

    fake.fail_list.store(true, Ordering::Relaxed);
    let (status, head, _) = send_raw(
        addr,
        "POST",
        "/dashboard/reload?region=Nyeri",
        &[("Cookie", &cookie)],
        "",
    )
    .await;
    assert_eq!(status, 303);
    assert!(header(&head, "location").is_some_and(|l| l.starts_with("/dashboard?region=Nyeri")));

    let (status, _, body) = get(addr, "/dashboard", &cookie).await;
    assert_eq!(status, 200);
    assert!(body.contains("No contracts"));
    assert_eq!(fake.list_calls.load(Ordering::Relaxed), 2);

    fake.fail_list.store(false, Ordering::Relaxed);
    send_raw(addr, "POST", "/dashboard/reload", &[("Cookie", &cookie)], "").await;
    let (_, _, body) = get(addr, "/dashboard", &cookie).await;
    assert!(body.contains("/contracts/A\""));
}

#[tokio::test]
async fn detail_shows_pending_weather_then_values() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    fake.weather.lock().await.insert("2025-07-01", 1.5);
    let addr = spawn_app(fake.clone(), DashboardConfig::default()).await;
    let cookie = login(addr).await;

    let (status, _, body) = get(addr, "/contracts/A", &cookie).await;
    assert_eq!(status, 200);
    assert!(body.contains("Contract A"));
    assert!(body.contains("25.00"), "individual claim is 50 / 2");

    let mut loaded = String::new();
    for _ in 0..50 {
        let (_, _, body) = get(addr, "/contracts/A", &cookie).await;
        if body.contains("1.5 mm") {
            loaded = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(loaded.contains("1.5 mm"), "weather eventually joins");
    // 2025-07-02 has no archive value: pending, never zero.
    assert!(loaded.contains("<td>pending</td>"));
    assert!(!loaded.contains("0.0 mm"));
    assert!(!loaded.contains("http-equiv=\"refresh\""));
    assert_eq!(fake.weather_calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn weather_load_in_flight_is_not_duplicated() {
    let fake = Arc::new(FakeGateway {
        weather_delay: Duration::from_millis(300),
        ..FakeGateway::with_contracts(fixture_contracts())
    });
    let addr = spawn_app(fake.clone(), DashboardConfig::default()).await;
    let cookie = login(addr).await;

    let (_, _, first) = get(addr, "/contracts/A", &cookie).await;
    let (_, _, second) = get(addr, "/contracts/A", &cookie).await;
    assert!(first.contains("<td>pending</td>"));
    assert!(second.contains("http-equiv=\"refresh\""));
    assert_eq!(fake.weather_calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn detail_paginates_beneficiaries_and_browses_fields() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let addr = spawn_app(fake.clone(), DashboardConfig::default()).await;
    let cookie = login(addr).await;

    let (_, _, body) = get(addr, "/contracts/C?bpage=2", &cookie).await;
    assert!(body.contains("Beneficiaries (7)"));
    assert!(body.contains("data-copy=\"0xc6\""));
    assert!(body.contains("data-copy=\"0xc7\""));
    assert!(!body.contains("data-copy=\"0xc1\""));
    assert!(body.contains("Page 2 of 2"));
    assert!(body.contains("https://sepolia.etherscan.io/address/0xc0ffee"));
    // No report block: no weather work at all.
    assert_eq!(fake.weather_calls.load(Ordering::Relaxed), 0);

    let (_, _, body) = get(addr, "/contracts/C?field=999", &cookie).await;
    assert!(body.contains("<strong>beneficiaries</strong>"));

    let (_, _, body) = get(addr, "/contracts/Z", &cookie).await;
    assert!(body.contains("Individual Claim:</strong> N/A"));
}

#[tokio::test]
async fn failed_detail_fetch_renders_error_with_retry() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let addr = spawn_app(fake.clone(), DashboardConfig::default()).await;
    let cookie = login(addr).await;

    fake.fail_detail.store(true, Ordering::Relaxed);
    let (status, _, body) = get(addr, "/contracts/A?bpage=1&field=2", &cookie).await;
    assert_eq!(status, 502);
    assert!(body.contains("Failed to load contract"));
    assert!(body.contains("href=\"/contracts/A?bpage=1&amp;field=2\">Retry</a>"));

    fake.fail_detail.store(false, Ordering::Relaxed);
    let (status, _, body) = get(addr, "/contracts/A?bpage=1&field=2", &cookie).await;
    assert_eq!(status, 200);
    assert!(body.contains("Contract A"));
    assert_eq!(fake.detail_calls.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn api_proxy_is_gated_and_reports_upstream_failures() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let addr = spawn_app(fake.clone(), DashboardConfig::default()).await;

    let (status, _, body) = send_raw(addr, "GET", "/api/contracts", &[], "").await;
    assert_eq!(status, 401);
    let json: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(json["error"]["code"], "unauthenticated");

    let cookie = login(addr).await;
    let (status, _, body) = get(addr, "/api/contracts", &cookie).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("list json");
    assert_eq!(json["contracts"].as_array().map(Vec::len), Some(4));

    let (status, _, body) = get(addr, "/api/contracts/B", &cookie).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("detail json");
    assert_eq!(json["id"], "B");

    let (status, _, body) = get(addr, "/api/contracts/missing", &cookie).await;
    assert_eq!(status, 502);
    let json: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(json["error"]["code"], "upstream_status");
    assert_eq!(json["error"]["details"]["upstream_status"], 404);
}

#[tokio::test]
async fn healthz_and_request_id_echo() {
    let fake = Arc::new(FakeGateway::default());
    let addr = spawn_app(fake, DashboardConfig::default()).await;

    let (status, head, body) = send_raw(addr, "GET", "/healthz", &[], "").await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
    assert!(header(&head, "x-request-id").is_some_and(|v| v.starts_with("req-")));

    let (_, head, _) = send_raw(addr, "GET", "/healthz", &[("x-request-id", "trace-me")], "").await;
    assert_eq!(header(&head, "x-request-id"), Some("trace-me"));
}

#[tokio::test]
async fn contract_ids_with_spaces_link_to_their_detail() {
    let fake = Arc::new(FakeGateway::with_contracts(vec![json!({
        "id": "KE 001",
        "region": {"name": "Nyeri"},
        "total_premium": 10,
        "created_at": "2025-07-01",
        "beneficiaries": ["0xk1"]
    })]));
    let addr = spawn_app(fake.clone(), DashboardConfig::default()).await;
    let cookie = login(addr).await;

    let (_, _, body) = get(addr, "/dashboard", &cookie).await;
    let start = body.find("href=\"/contracts/").expect("detail link") + "href=\"".len();
    let end = start + body[start..].find('"').expect("closing quote");
    let link = &body[start..end];
    assert_eq!(link, "/contracts/KE%20001");

    let (status, _, body) = get(addr, link, &cookie).await;
    assert_eq!(status, 200);
    assert!(body.contains("KE 001"));
    assert!(!body.contains("Retry</a>"));

    fake.fail_detail.store(true, Ordering::Relaxed);
    let (status, _, body) = get(addr, link, &cookie).await;
    assert_eq!(status, 502);
    assert!(body.contains("href=\"/contracts/KE%20001?bpage=1&amp;field=0\">Retry</a>"));
}

#[tokio::test]
async fn oldest_session_is_evicted_past_the_cap() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let config = DashboardConfig {
        max_sessions: 2,
        ..DashboardConfig::default()
    };
    let addr = spawn_app(fake, config).await;

    let first = login(addr).await;
    let second = login(addr).await;
    let third = login(addr).await;

    let (status, head, _) = get(addr, "/dashboard", &first).await;
    assert_eq!(status, 303);
    assert_eq!(header(&head, "location"), Some("/"));
    for cookie in [&second, &third] {
        let (status, _, _) = get(addr, "/dashboard", cookie).await;
        assert_eq!(status, 200);
    }
}

#[tokio::test]
async fn idle_sessions_must_log_in_again() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let config = DashboardConfig {
        session_idle_timeout: Duration::from_millis(100),
        ..DashboardConfig::default()
    };
    let addr = spawn_app(fake, config).await;
    let cookie = login(addr).await;

    let (status, _, _) = get(addr, "/dashboard", &cookie).await;
    assert_eq!(status, 200);
    tokio::time::sleep(Duration::from_millis(250)).await;
    let (status, head, _) = get(addr, "/dashboard", &cookie).await;
    assert_eq!(status, 303);
    assert_eq!(header(&head, "location"), Some("/"));
}

#[tokio::test]
async fn rejected_logins_do_not_take_session_slots() {
    let fake = Arc::new(FakeGateway::with_contracts(fixture_contracts()));
    let config = DashboardConfig {
        max_sessions: 1,
        ..DashboardConfig::default()
    };
    let addr = spawn_app(fake, config).await;
    let cookie = login(addr).await;

    for _ in 0..3 {
        let (status, head, _) = send_raw(
            addr,
            "POST",
            "/login",
            &[FORM],
            "username=partner&password=wrong",
        )
        .await;
        assert_eq!(status, 401);
        assert!(header(&head, "set-cookie").is_none());
    }

    let (status, _, _) = get(addr, "/dashboard", &cookie).await;
    assert_eq!(status, 200);
}
