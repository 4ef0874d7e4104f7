// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage units: the physical containers tracked by the ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Kind of physical container
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitKind {
    Folder,
    Envelope,
    Cabinet,
    Box,
}

impl UnitKind {
    pub const ALL: [UnitKind; 4] = [
        UnitKind::Folder,
        UnitKind::Envelope,
        UnitKind::Cabinet,
        UnitKind::Box,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Folder => "FOLDER",
            UnitKind::Envelope => "ENVELOPE",
            UnitKind::Cabinet => "CABINET",
            UnitKind::Box => "BOX",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        UnitKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == upper)
            .ok_or_else(|| format!("unknown unit type: {}", s.trim()))
    }
}

/// A storage unit as persisted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUnit {
    pub id: i64,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: UnitKind,
    pub section: Option<String>,
    pub capacity: u32,
    pub occupancy: u32,
    /// Opaque structured metadata. `None` (field omitted) is distinct from
    /// `Some(Value::Null)`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a storage unit, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct NewStorageUnit {
    pub label: String,
    pub kind: UnitKind,
    pub section: Option<String>,
    pub capacity: u32,
    pub metadata: Option<Value>,
}

impl NewStorageUnit {
    pub fn new(label: impl Into<String>, kind: UnitKind) -> Self {
        Self {
            label: label.into(),
            kind,
            section: None,
            capacity: 0,
            metadata: None,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Deserialize an optional field so that an explicit `null` becomes
/// `Some(Value::Null)` while a missing field (via `#[serde(default)]`) stays `None`.
pub fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[path = "unit_tests.rs"]
mod tests;
