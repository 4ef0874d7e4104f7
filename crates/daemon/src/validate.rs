// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request validation at the transport boundary.
//!
//! Each check records its violation and moves on, so a rejected request
//! reports every problem at once.

use crate::protocol::{MovementPayload, UnitPayload};
use serde_json::Value;
use sm_core::{Credentials, NewMovement, NewStorageUnit, UnitKind, ValidationError};

fn required(errors: &mut ValidationError, field: &str, value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            errors.push(format!("{} is required", field));
            String::new()
        }
    }
}

/// Trimmed; blank becomes absent
fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a login attempt. The password is kept verbatim.
pub fn credentials(login: &str, password: &str) -> Result<Credentials, ValidationError> {
    let mut errors = ValidationError::new();
    let login = required(&mut errors, "login", Some(login));
    if password.trim().is_empty() {
        errors.push("password is required");
    }
    errors.finish(|| Credentials {
        login,
        password: password.to_string(),
    })
}

/// A session token must be present before the session gate is consulted
pub fn token(token: &str) -> Result<(), ValidationError> {
    let mut errors = ValidationError::new();
    required(&mut errors, "token", Some(token));
    errors.finish(|| ())
}

fn capacity(errors: &mut ValidationError, raw: Option<&Value>) -> u32 {
    let Some(raw) = raw else {
        return 0;
    };
    match raw.as_u64().map(u32::try_from) {
        Some(Ok(capacity)) => capacity,
        Some(Err(_)) => {
            errors.push(format!("capacity must be at most {}", u32::MAX));
            0
        }
        None => {
            errors.push("capacity must be a non-negative integer");
            0
        }
    }
}

impl UnitPayload {
    pub fn validate(&self) -> Result<NewStorageUnit, ValidationError> {
        let mut errors = ValidationError::new();
        let label = required(&mut errors, "label", self.label.as_deref());

        let kind = match self.kind.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => match raw.parse::<UnitKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    errors.push(format!(
                        "type must be one of FOLDER, ENVELOPE, CABINET, BOX (got {})",
                        raw
                    ));
                    None
                }
            },
            _ => {
                errors.push("type is required");
                None
            }
        };
        let capacity = capacity(&mut errors, self.capacity.as_ref());

        match kind {
            Some(kind) if errors.is_empty() => Ok(NewStorageUnit {
                label,
                kind,
                section: optional(self.section.as_deref()),
                capacity,
                metadata: self.metadata.clone(),
            }),
            _ => Err(errors),
        }
    }
}

impl MovementPayload {
    pub fn validate(&self) -> Result<NewMovement, ValidationError> {
        let mut errors = ValidationError::new();
        let action = required(&mut errors, "action", self.action.as_deref());
        errors.finish(|| NewMovement {
            action,
            reference: optional(self.reference.as_deref()),
            item_label: optional(self.item_label.as_deref()),
            from_unit: optional(self.from_unit.as_deref()),
            to_unit: optional(self.to_unit.as_deref()),
            note: optional(self.note.as_deref()),
        })
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
