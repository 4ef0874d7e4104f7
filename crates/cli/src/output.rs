// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use sm_core::{Movement, Profile, Snapshot, StorageUnit};
use sm_daemon::SessionInfo;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => print!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

struct SnapshotLines<'a>(&'a Snapshot);

impl fmt::Display for SnapshotLines<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        let by_type: Vec<String> = snapshot
            .units_by_type
            .iter()
            .map(|(kind, count)| format!("{} {}", kind, count))
            .collect();
        writeln!(
            f,
            "Units: {} ({})",
            snapshot.total_units,
            by_type.join(", ")
        )?;
        writeln!(f, "Movements today: {}", snapshot.movements_today)?;
        match &snapshot.last_movement {
            Some(m) => writeln!(
                f,
                "Last movement: {} {} by {}",
                m.created_at.format(TIME_FORMAT),
                m.action,
                m.actor
            ),
            None => writeln!(f, "Last movement: none"),
        }
    }
}

fn write_profile(f: &mut fmt::Formatter<'_>, profile: &Profile) -> fmt::Result {
    writeln!(f, "Name: {}", profile.name)?;
    writeln!(f, "Login: {}", profile.login)?;
    writeln!(f, "Role: {}", profile.role)
}

/// An authenticated session; the token is never shown
#[derive(Serialize)]
pub struct SessionView<'a> {
    pub profile: &'a Profile,
    pub snapshot: &'a Snapshot,
}

impl<'a> From<&'a SessionInfo> for SessionView<'a> {
    fn from(session: &'a SessionInfo) -> Self {
        Self {
            profile: &session.profile,
            snapshot: &session.snapshot,
        }
    }
}

impl fmt::Display for SessionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_profile(f, self.profile)?;
        write!(f, "{}", SnapshotLines(self.snapshot))
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct UnitList<'a>(pub &'a [StorageUnit]);

impl fmt::Display for UnitList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No storage units");
        }
        writeln!(
            f,
            "{:<6} {:<20} {:<9} {:<12} {:>9} UPDATED",
            "ID", "LABEL", "TYPE", "SECTION", "OCCUPANCY"
        )?;
        for unit in self.0 {
            writeln!(
                f,
                "{:<6} {:<20} {:<9} {:<12} {:>9} {}",
                unit.id,
                unit.label,
                unit.kind,
                or_dash(unit.section.as_deref()),
                format!("{}/{}", unit.occupancy, unit.capacity),
                unit.updated_at.format(TIME_FORMAT)
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct MovementList<'a>(pub &'a [Movement]);

impl fmt::Display for MovementList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No movements");
        }
        writeln!(
            f,
            "{:<6} {:<16} {:<20} {:<20} ROUTE",
            "ID", "WHEN", "ACTOR", "ACTION"
        )?;
        for m in self.0 {
            writeln!(
                f,
                "{:<6} {:<16} {:<20} {:<20} {} -> {}",
                m.id,
                m.created_at.format(TIME_FORMAT).to_string(),
                m.actor,
                m.action,
                or_dash(m.from_unit.as_deref()),
                or_dash(m.to_unit.as_deref())
            )?;
        }
        Ok(())
    }
}

/// A created unit with the snapshot taken after the write
#[derive(Serialize)]
pub struct UnitCreated<'a> {
    pub unit: &'a StorageUnit,
    pub snapshot: &'a Snapshot,
}

impl fmt::Display for UnitCreated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Created {} {} (id {})",
            self.unit.kind, self.unit.label, self.unit.id
        )?;
        write!(f, "{}", SnapshotLines(self.snapshot))
    }
}

/// A recorded movement with the snapshot taken after the write
#[derive(Serialize)]
pub struct MovementRecorded<'a> {
    pub movement: &'a Movement,
    pub snapshot: &'a Snapshot,
}

impl fmt::Display for MovementRecorded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Recorded movement {}: {} by {}",
            self.movement.id, self.movement.action, self.movement.actor
        )?;
        write!(f, "{}", SnapshotLines(self.snapshot))
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
