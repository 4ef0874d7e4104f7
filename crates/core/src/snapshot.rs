// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate summary of ledger and log state

use crate::movement::Movement;
use crate::unit::UnitKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A freshly computed summary. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub total_units: u64,
    /// Always contains every `UnitKind`, zero-filled
    pub units_by_type: BTreeMap<UnitKind, u64>,
    pub movements_today: u64,
    pub last_movement: Option<Movement>,
}

impl Snapshot {
    /// Build a snapshot from per-kind counts.
    ///
    /// Kinds missing from `counts` are zero-filled and `total_units` is the
    /// sum of the per-kind counts, so the two can never disagree.
    pub fn from_counts(
        counts: impl IntoIterator<Item = (UnitKind, u64)>,
        movements_today: u64,
        last_movement: Option<Movement>,
    ) -> Self {
        let mut units_by_type: BTreeMap<UnitKind, u64> =
            UnitKind::ALL.into_iter().map(|kind| (kind, 0)).collect();
        for (kind, count) in counts {
            *units_by_type.entry(kind).or_insert(0) += count;
        }
        let total_units = units_by_type.values().sum();
        Self {
            total_units,
            units_by_type,
            movements_today,
            last_movement,
        }
    }

    /// Count for a single kind
    pub fn units_of(&self, kind: UnitKind) -> u64 {
        self.units_by_type.get(&kind).copied().unwrap_or(0)
    }
}
