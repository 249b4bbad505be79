// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Static region table used by the map and the weather join.
pub const REGION_COORDINATES: &[(&str, Coordinates)] = &[
    (
        "Marikiti",
        Coordinates {
            lat: -1.2921,
            lng: 36.8219,
        },
    ),
    (
        "Nyeri",
        Coordinates {
            lat: -0.4371,
            lng: 36.9580,
        },
    ),
    (
        "Kitengela",
        Coordinates {
            lat: -1.5167,
            lng: 36.85,
        },
    ),
];

pub const DEFAULT_MAP_CENTER: Coordinates = Coordinates {
    lat: -1.2921,
    lng: 36.8219,
};

/// Exact, case-sensitive lookup. Unknown regions return `None`.
#[must_use]
pub fn region_coordinates(name: &str) -> Option<Coordinates> {
    REGION_COORDINATES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, coords)| *coords)
}
