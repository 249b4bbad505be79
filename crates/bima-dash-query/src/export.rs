// SPDX-License-Identifier: Apache-2.0

use crate::query_error::QueryError;
use bima_dash_model::{format_calendar_date, Contract};

pub const EXPORT_FILENAME: &str = "contracts.csv";
pub const EXPORT_COLUMNS: [&str; 7] = [
    "id",
    "region",
    "beneficiaries",
    "premium",
    "payout",
    "status",
    "created_at",
];

/// Serializes every row handed in, not just one page. Callers pass the
/// filtered and sorted collection.
pub fn export_csv(sorted: &[Contract]) -> Result<Vec<u8>, QueryError> {
    let mut writer = csv::Writer::from_writer(Vec::with_capacity(64 + sorted.len() * 96));
    writer.write_record(EXPORT_COLUMNS)?;
    for c in sorted {
        writer.write_record([
            c.id.clone(),
            c.region.name.clone(),
            c.beneficiary_count().to_string(),
            c.total_premium.to_string(),
            c.total_claim_amount.to_string(),
            c.status().as_str().to_string(),
            format_calendar_date(&c.created_at),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| QueryError::new(crate::QueryErrorCode::Export, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bima_dash_model::Beneficiary;

    #[test]
    fn exports_header_and_one_row_per_contract() {
        let rows = vec![
            Contract::new("A", "Nyeri")
                .with_premium(100.0)
                .with_claim_amount(12.5)
                .with_fulfilled(true)
                .with_created_at("2025-06-20T08:00:00Z")
                .with_beneficiaries(vec![Beneficiary::Address("x".to_string())]),
            Contract::new("B,2", "Kitengela").with_premium(50.0),
        ];
        let out = String::from_utf8(export_csv(&rows).expect("csv")).expect("utf8");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "id,region,beneficiaries,premium,payout,status,created_at",
                "A,Nyeri,1,100,12.5,Settled,2025-06-20",
                "\"B,2\",Kitengela,0,50,0,Active,Invalid date",
            ]
        );
    }

    #[test]
    fn empty_export_is_header_only() {
        let out = String::from_utf8(export_csv(&[]).expect("csv")).expect("utf8");
        assert_eq!(out, "id,region,beneficiaries,premium,payout,status,created_at\n");
    }
}
