// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Movements: immutable entries of the audit log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of movements returned when no limit is requested
pub const DEFAULT_MOVEMENT_LIMIT: u32 = 25;

/// Upper bound on a requested movement limit
pub const MAX_MOVEMENT_LIMIT: u32 = 500;

/// Action recorded when a storage unit is registered
pub const REGISTRATION_ACTION: &str = "unit registered";

/// A recorded movement. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub reference: Option<String>,
    pub item_label: Option<String>,
    pub from_unit: Option<String>,
    pub to_unit: Option<String>,
    pub action: String,
    pub note: Option<String>,
    /// Display name of the authenticated account that recorded it
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a movement, already validated.
///
/// There is no actor field: the actor always comes from the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewMovement {
    pub action: String,
    pub reference: Option<String>,
    pub item_label: Option<String>,
    pub from_unit: Option<String>,
    pub to_unit: Option<String>,
    pub note: Option<String>,
}

impl NewMovement {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    /// The movement appended when a unit is registered
    pub fn registration(label: &str) -> Self {
        Self {
            action: REGISTRATION_ACTION.to_string(),
            reference: Some(label.to_string()),
            to_unit: Some(label.to_string()),
            note: Some(format!("unit {} created", label)),
            ..Self::default()
        }
    }

    pub fn item(mut self, item_label: impl Into<String>) -> Self {
        self.item_label = Some(item_label.into());
        self
    }

    pub fn from_unit(mut self, label: impl Into<String>) -> Self {
        self.from_unit = Some(label.into());
        self
    }

    pub fn to_unit(mut self, label: impl Into<String>) -> Self {
        self.to_unit = Some(label.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Whether this movement moves an item and so affects occupancy
    pub fn moves_item(&self) -> bool {
        self.item_label.is_some()
    }
}

/// Clamp a requested list limit into `1..=MAX_MOVEMENT_LIMIT`
pub fn clamp_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_MOVEMENT_LIMIT)
        .clamp(1, MAX_MOVEMENT_LIMIT)
}
