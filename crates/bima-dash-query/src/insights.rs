// SPDX-License-Identifier: Apache-2.0

use bima_dash_model::{Contract, Coordinates, DEFAULT_MAP_CENTER};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Infographics {
    pub total_beneficiaries: usize,
    pub total_premium: f64,
    pub total_payout: f64,
}

/// Totals over the filtered set, not the visible page.
#[must_use]
pub fn infographics(filtered: &[Contract]) -> Infographics {
    filtered.iter().fold(Infographics::default(), |acc, c| Infographics {
        total_beneficiaries: acc.total_beneficiaries + c.beneficiary_count(),
        total_premium: acc.total_premium + c.total_premium,
        total_payout: acc.total_payout + c.total_claim_amount,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub region: String,
    pub coords: Coordinates,
    pub beneficiary_count: usize,
}

/// One marker per known region, first-seen order. Regions missing from the
/// coordinate table are skipped.
#[must_use]
pub fn map_markers(filtered: &[Contract]) -> Vec<MapMarker> {
    let mut markers: Vec<MapMarker> = Vec::new();
    for c in filtered {
        let Some(coords) = c.region.coordinates() else {
            continue;
        };
        match markers.iter_mut().find(|m| m.region == c.region.name) {
            Some(existing) => existing.beneficiary_count += c.beneficiary_count(),
            None => markers.push(MapMarker {
                region: c.region.name.clone(),
                coords,
                beneficiary_count: c.beneficiary_count(),
            }),
        }
    }
    markers
}

#[must_use]
pub fn map_center(markers: &[MapMarker]) -> Coordinates {
    markers.first().map_or(DEFAULT_MAP_CENTER, |m| m.coords)
}
