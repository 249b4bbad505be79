// SPDX-License-Identifier: Apache-2.0
//! Server-rendered views. Pure functions from view models to HTML.

use crate::http::html::{encode_path_segment, escape, href};
use bima_dash_model::{format_calendar_date, Coordinates};
use bima_dash_query::{
    ContractDetail, FieldValue, Infographics, ListQuery, ListView, MapMarker,
    SortKey,
};
use chrono::{DateTime, Utc};

const STYLE: &str = "<style>\
body{font-family:system-ui,sans-serif;margin:0;background:#111827;color:#f3f4f6}\
header{display:flex;justify-content:space-between;align-items:center;padding:1rem 1.5rem;background:#1f2937}\
main{max-width:80rem;margin:0 auto;padding:1.5rem}\
a{color:#818cf8}table{border-collapse:collapse;width:100%}\
th,td{padding:.5rem;border-bottom:1px solid #374151;text-align:left}\
.panel{background:#1f2937;padding:1rem;border-radius:.25rem;margin:.5rem 0}\
.error{color:#f87171}.muted{color:#9ca3af}\
#map{height:20rem;border-radius:.25rem}\
</style>";

const LEAFLET_HEAD: &str = "<link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.css\">\
<script src=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.js\"></script>";

const MAP_SCRIPT: &str = "<script>(function(){\
var el=document.getElementById('map');if(!el||!window.L)return;\
var c=JSON.parse(el.dataset.center),ms=JSON.parse(el.dataset.markers);\
var map=L.map(el).setView([c.lat,c.lng],7);\
L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png',{attribution:'&copy; OpenStreetMap'}).addTo(map);\
ms.forEach(function(m){L.marker([m.coords.lat,m.coords.lng]).addTo(map).bindPopup(m.region+': '+m.beneficiary_count+' beneficiaries');});\
})();</script>";

const COPY_SCRIPT: &str = "<script>document.querySelectorAll('button[data-copy]').forEach(function(b){\
b.addEventListener('click',function(){navigator.clipboard&&navigator.clipboard.writeText(b.dataset.copy);});});</script>";

fn amount(v: f64) -> String {
    format!("{v:.2}")
}

pub(crate) fn layout(
    title: &str,
    body: &str,
    authenticated: bool,
    refresh_secs: Option<u32>,
) -> String {
    let refresh = refresh_secs
        .map(|s| format!("<meta http-equiv=\"refresh\" content=\"{s}\">"))
        .unwrap_or_default();
    let logout = if authenticated {
        "<form method=\"post\" action=\"/logout\"><button type=\"submit\">Logout</button></form>"
    } else {
        ""
    };
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">{refresh}\
<title>{}</title>{STYLE}{LEAFLET_HEAD}</head><body>\
<header><strong>Fortune Credit</strong><div style=\"display:flex;gap:1rem;align-items:center\">{logout}<strong>BlockBima</strong></div></header>\
<main>{body}</main></body></html>",
        escape(title)
    )
}

pub(crate) fn login_page(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!("<p class=\"error\">{}</p>", escape(e)))
        .unwrap_or_default();
    let body = format!(
        "<h1>Partner Login</h1><form class=\"panel\" method=\"post\" action=\"/login\">{error}\
<p><label>Username <input type=\"text\" name=\"username\" autocomplete=\"username\"></label></p>\
<p><label>Password <input type=\"password\" name=\"password\" autocomplete=\"current-password\"></label></p>\
<button type=\"submit\">Log In</button></form>"
    );
    layout("Partner Login", &body, false, None)
}

pub(crate) struct DashboardModel<'a> {
    pub query: &'a ListQuery,
    pub view: &'a ListView,
    pub regions: &'a [String],
    pub last_fetched: Option<DateTime<Utc>>,
    pub infographics: Infographics,
    pub markers: &'a [MapMarker],
    pub center: Coordinates,
}

fn list_params(query: &ListQuery) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.filter.search_term.clone()),
        ("region", query.filter.region.clone()),
        ("sort", query.sort.key.as_str().to_string()),
        ("dir", query.sort.direction.as_str().to_string()),
    ]
}

pub(crate) fn dashboard_href(query: &ListQuery, page: usize) -> String {
    let mut params = list_params(query);
    params.push(("page", page.to_string()));
    href("/dashboard", &params)
}

fn sort_header(query: &ListQuery, key: SortKey, page: usize) -> String {
    let toggled = ListQuery {
        sort: query.sort.toggle(key),
        ..query.clone()
    };
    let arrow = if query.sort.key == key {
        query.sort.direction.arrow()
    } else {
        ""
    };
    format!(
        "<th><a href=\"{}\">{}</a> {arrow}</th>",
        escape(&dashboard_href(&toggled, page)),
        key.label()
    )
}

pub(crate) fn dashboard_page(model: &DashboardModel<'_>) -> String {
    let query = model.query;
    let page = &model.view.page;

    let mut region_select = String::from("<option value=\"\">All Regions</option>");
    for r in model.regions {
        let selected = if *r == query.filter.region { " selected" } else { "" };
        region_select.push_str(&format!(
            "<option value=\"{0}\"{selected}>{0}</option>",
            escape(r)
        ));
    }
    let last_fetched = model
        .last_fetched
        .map(|t| {
            format!(
                "<span class=\"muted\">Last updated: {}</span>",
                t.format("%H:%M:%S UTC")
            )
        })
        .unwrap_or_default();
    let controls = format!(
        "<div class=\"panel\"><form method=\"get\" action=\"/dashboard\">\
<input name=\"q\" placeholder=\"Search by ID or beneficiary\" value=\"{}\">\
<select name=\"region\">{region_select}</select>\
<input type=\"hidden\" name=\"sort\" value=\"{}\"><input type=\"hidden\" name=\"dir\" value=\"{}\">\
<button type=\"submit\">Apply</button></form>\
<a href=\"{}\">Export CSV</a>\
<form method=\"post\" action=\"{}\" style=\"display:inline\"><button type=\"submit\">Reload</button></form>\
{last_fetched}</div>",
        escape(&query.filter.search_term),
        query.sort.key.as_str(),
        query.sort.direction.as_str(),
        escape(&href("/dashboard/export.csv", &list_params(query))),
        escape(&href("/dashboard/reload", &list_params(query))),
    );

    let headers: String = SortKey::ALL
        .iter()
        .map(|k| sort_header(query, *k, page.page))
        .collect();
    let mut rows = String::new();
    for c in &page.items {
        rows.push_str(&format!(
            "<tr><td><a href=\"/contracts/{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&encode_path_segment(&c.id)),
            escape(&c.id),
            escape(&c.region.name),
            c.beneficiary_count(),
            amount(c.total_premium),
            amount(c.total_claim_amount),
            c.status(),
            escape(&format_calendar_date(&c.created_at)),
        ));
    }
    if rows.is_empty() {
        rows.push_str("<tr><td colspan=\"7\" class=\"muted\">No contracts</td></tr>");
    }
    let prev = if page.has_prev() {
        format!(
            "<a href=\"{}\">Prev</a>",
            escape(&dashboard_href(query, page.page - 1))
        )
    } else {
        "<span class=\"muted\">Prev</span>".to_string()
    };
    let next = if page.has_next() {
        format!(
            "<a href=\"{}\">Next</a>",
            escape(&dashboard_href(query, page.page + 1))
        )
    } else {
        "<span class=\"muted\">Next</span>".to_string()
    };
    let table = format!(
        "<table><thead><tr><th>ID</th>{headers}</tr></thead><tbody>{rows}</tbody></table>\
<p>{prev} Page {} of {} {next}</p>",
        page.page, page.total_pages
    );

    let info = &model.infographics;
    let infographics = format!(
        "<div class=\"panel\"><h4>Total Beneficiaries</h4><p>{}</p></div>\
<div class=\"panel\"><h4>Total Premium</h4><p>{}</p></div>\
<div class=\"panel\"><h4>Total Payout</h4><p>{}</p></div>",
        info.total_beneficiaries,
        amount(info.total_premium),
        amount(info.total_payout)
    );
    let map = format!(
        "<div id=\"map\" data-center=\"{}\" data-markers=\"{}\"></div>{MAP_SCRIPT}",
        escape(&serde_json::to_string(&model.center).unwrap_or_default()),
        escape(&serde_json::to_string(model.markers).unwrap_or_else(|_| "[]".to_string())),
    );

    let body = format!(
        "<h1>Contracts</h1>{controls}{table}<section><h2>Overview</h2>{infographics}{map}</section>"
    );
    layout("Contracts", &body, true, None)
}

pub(crate) struct DetailModel<'a> {
    pub detail: &'a ContractDetail,
    /// A weather load for this contract is still running.
    pub weather_pending: bool,
}

pub(crate) fn detail_href(id: &str, bpage: usize, field: usize) -> String {
    href(
        &format!("/contracts/{}", encode_path_segment(id)),
        &[("bpage", bpage.to_string()), ("field", field.to_string())],
    )
}

fn field_value_html(value: &FieldValue) -> String {
    match value {
        FieldValue::Text { text } => format!("<pre>{}</pre>", escape(text)),
        FieldValue::Link { text, href } => format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
            escape(href),
            escape(text)
        ),
    }
}

pub(crate) fn detail_page(model: &DetailModel<'_>) -> String {
    let d = model.detail;
    let cursor = d.fields.cursor();
    let bpage = d.beneficiaries.page;

    let smart_contract = d
        .smart_contract
        .as_ref()
        .map_or_else(|| "N/A".to_string(), field_value_html);
    let summary = format!(
        "<div class=\"panel\"><p><strong>Region:</strong> {}</p>\
<p><strong>Premium:</strong> {}</p><p><strong>Total Claim:</strong> {}</p>\
<p><strong>Status:</strong> {}</p><p><strong>Maturity Date:</strong> {}</p>\
<p><strong>Smart Contract:</strong> {smart_contract}</p>\
<p><strong>Individual Claim:</strong> {}</p></div>",
        escape(&d.region),
        amount(d.total_premium),
        amount(d.total_claim_amount),
        d.status,
        escape(&d.maturity_date),
        d.individual_claim,
    );

    let mut beneficiaries = String::new();
    for b in &d.beneficiaries.items {
        beneficiaries.push_str(&format!(
            "<li><code>{}</code> <button type=\"button\" data-copy=\"{}\">Copy</button></li>",
            escape(&b.label()),
            escape(b.wallet())
        ));
    }
    if beneficiaries.is_empty() {
        beneficiaries.push_str("<li class=\"muted\">No beneficiaries</li>");
    }
    let bprev = if d.beneficiaries.has_prev() {
        format!("<a href=\"{}\">Prev</a>", escape(&detail_href(&d.id, bpage - 1, cursor)))
    } else {
        String::new()
    };
    let bnext = if d.beneficiaries.has_next() {
        format!("<a href=\"{}\">Next</a>", escape(&detail_href(&d.id, bpage + 1, cursor)))
    } else {
        String::new()
    };
    let beneficiary_block = format!(
        "<section class=\"panel\"><h3>Beneficiaries ({})</h3><ul>{beneficiaries}</ul>\
<p>{bprev} Page {} of {} {bnext}</p></section>",
        d.beneficiaries.total_items, bpage, d.beneficiaries.total_pages
    );

    let field_block = match d.fields.current() {
        Some(entry) => {
            let fprev = if d.fields.has_prev() {
                format!(
                    "<a href=\"{}\">Prev</a>",
                    escape(&detail_href(&d.id, bpage, cursor - 1))
                )
            } else {
                String::new()
            };
            let fnext = if d.fields.has_next() {
                format!(
                    "<a href=\"{}\">Next</a>",
                    escape(&detail_href(&d.id, bpage, cursor + 1))
                )
            } else {
                String::new()
            };
            format!(
                "<section class=\"panel\"><h3>Fields</h3><p><strong>{}</strong> ({} of {})</p>{}<p>{fprev} {fnext}</p></section>",
                entry.name,
                cursor + 1,
                d.fields.len(),
                field_value_html(&entry.value)
            )
        }
        None => String::new(),
    };

    let report_block = match &d.daily_rows {
        Some(rows) => {
            let mut body = String::new();
            for r in rows {
                body.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&r.date),
                    escape(&r.reported_value),
                    escape(&r.calculated_payout),
                    r.precipitation
                ));
            }
            format!(
                "<section class=\"panel\"><h3>Daily Report</h3><table><thead><tr>\
<th>Date</th><th>Reported Value</th><th>Calculated Payout</th><th>Precipitation</th>\
</tr></thead><tbody>{body}</tbody></table></section>"
            )
        }
        None => String::new(),
    };

    let body = format!(
        "<p><a href=\"/dashboard\">Back to contracts</a></p><h2>Contract {}</h2>\
{summary}{beneficiary_block}{field_block}{report_block}{COPY_SCRIPT}",
        escape(&d.id)
    );
    let refresh = model.weather_pending.then_some(3);
    layout(&format!("Contract {}", d.id), &body, true, refresh)
}

pub(crate) fn detail_error_page(id: &str, message: &str, retry_href: &str) -> String {
    let body = format!(
        "<p><a href=\"/dashboard\">Back to contracts</a></p>\
<div class=\"panel\"><h2>Contract {}</h2><p class=\"error\">Failed to load contract: {}</p>\
<a href=\"{}\">Retry</a></div>",
        escape(id),
        escape(message),
        escape(retry_href)
    );
    layout("Contract unavailable", &body, true, None)
}
