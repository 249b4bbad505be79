#![forbid(unsafe_code)]
//! Client-facing contract processing: the list pipeline
//! (filter → sort → paginate → export) and the single-contract detail view.

mod detail;
mod export;
mod insights;
mod list;
mod page;
mod query_error;

pub use detail::{
    join_weather, render_detail, ContractDetail, DailyReportRow, DetailRequest, ExplorerLinks,
    FieldBrowser, FieldEntry, FieldValue, Precipitation, DEFAULT_BENEFICIARY_PAGE_SIZE,
    PENDING_PLACEHOLDER,
};
pub use export::{export_csv, EXPORT_COLUMNS, EXPORT_FILENAME};
pub use insights::{infographics, map_center, map_markers, Infographics, MapMarker};
pub use list::{
    compare_by_key, filter_contracts, region_options, run_list_pipeline, sort_contracts,
    ContractFilter, ListQuery, ListView, SortDirection, SortKey, SortState,
};
pub use page::{clamp_page, paginate, total_pages, Page};
pub use query_error::{QueryError, QueryErrorCode};

pub const CRATE_NAME: &str = "bima-dash-query";
pub const DEFAULT_LIST_PAGE_SIZE: usize = 10;
