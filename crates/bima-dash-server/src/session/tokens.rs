// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

/// Identifies one load cycle for one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadToken {
    view: String,
    seq: u64,
}

#[derive(Debug, Default)]
struct TokenTable {
    seq: u64,
    current: HashMap<String, u64>,
    in_flight: HashSet<String>,
}

impl TokenTable {
    fn start(&mut self, view: &str) -> LoadToken {
        self.seq += 1;
        self.current.insert(view.to_string(), self.seq);
        self.in_flight.insert(view.to_string());
        LoadToken {
            view: view.to_string(),
            seq: self.seq,
        }
    }
}

/// Per-session registry of outstanding loads, keyed by view name
/// (`list`, `weather:{contract_id}`).
///
/// A newer `begin` supersedes older tokens for the same view, so a slow
/// load that completes late is discarded instead of overwriting fresher data.
#[derive(Debug, Default)]
pub struct LoadTokens {
    table: Mutex<TokenTable>,
}

impl LoadTokens {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a load for `view`, superseding any load already running.
    pub async fn begin(&self, view: &str) -> LoadToken {
        self.table.lock().await.start(view)
    }

    /// Starts a load for `view` unless one is already in flight.
    pub async fn try_begin(&self, view: &str) -> Option<LoadToken> {
        let mut table = self.table.lock().await;
        if table.in_flight.contains(view) {
            return None;
        }
        Some(table.start(view))
    }

    /// Ends the load. Returns `false` when the token was superseded and
    /// the result must be dropped.
    pub async fn finish(&self, token: &LoadToken) -> bool {
        let mut table = self.table.lock().await;
        let current = table.current.get(&token.view) == Some(&token.seq);
        if current {
            table.in_flight.remove(&token.view);
        }
        current
    }
}
