//! Roster Index
//!
//! Immutable registration id → participant lookup, built once from the
//! roster dataset and shared read-only afterwards.
//!
//! Load policy is lenient: entries missing a key field (or carrying a blank
//! one) are skipped and counted, never fatal. When an identifier repeats,
//! the first occurrence wins and later ones are ignored.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// One participant as known to the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub registration_id: String,
    pub full_name: String,
    pub program: String,
}

/// Unvalidated roster row, as supplied by the dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterEntry {
    pub registration_id: Option<String>,
    pub full_name: Option<String>,
    pub program: Option<String>,
}

impl RosterEntry {
    /// Convert to a record, or `None` when a key field is missing or blank
    fn into_record(self) -> Option<ParticipantRecord> {
        let non_blank = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Some(ParticipantRecord {
            registration_id: non_blank(self.registration_id)?,
            full_name: non_blank(self.full_name)?,
            program: non_blank(self.program)?,
        })
    }
}

/// JSON row shape. `MATRICULA` may be a string or an integer.
#[derive(Debug, Deserialize)]
struct JsonRosterRow {
    #[serde(rename = "MATRICULA", alias = "registration_id", default)]
    registration_id: Option<serde_json::Value>,
    #[serde(rename = "ALUNO", alias = "full_name", default)]
    full_name: Option<String>,
    #[serde(rename = "CURSO", alias = "program", default)]
    program: Option<String>,
}

impl From<JsonRosterRow> for RosterEntry {
    fn from(row: JsonRosterRow) -> Self {
        let registration_id = match row.registration_id {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self {
            registration_id,
            full_name: row.full_name,
            program: row.program,
        }
    }
}

/// Immutable lookup table keyed by registration id
#[derive(Debug, Clone, Default)]
pub struct RosterIndex {
    records: HashMap<String, ParticipantRecord>,
    skipped: usize,
    duplicates: usize,
}

impl RosterIndex {
    /// An index with no participants; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from dataset rows in order
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = RosterEntry>,
    {
        let mut index = Self::default();

        for entry in entries {
            let Some(record) = entry.into_record() else {
                index.skipped += 1;
                continue;
            };

            if index.records.contains_key(&record.registration_id) {
                debug!(
                    registration_id = %record.registration_id,
                    "Duplicate roster entry ignored"
                );
                index.duplicates += 1;
                continue;
            }

            index
                .records
                .insert(record.registration_id.clone(), record);
        }

        if index.skipped > 0 {
            warn!("Roster load skipped {} malformed entries", index.skipped);
        }
        info!(
            participants = index.records.len(),
            skipped = index.skipped,
            duplicates = index.duplicates,
            "Roster index built"
        );

        index
    }

    /// Build from a JSON array of roster rows
    ///
    /// The document itself must be a JSON array; individual rows that do not
    /// fit the row shape are skipped like any other malformed entry.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| Error::Roster(format!("roster must be a JSON array: {}", e)))?;

        let entries = rows.into_iter().map(|row| {
            serde_json::from_value::<JsonRosterRow>(row)
                .map(RosterEntry::from)
                .unwrap_or_default()
        });

        Ok(Self::from_entries(entries))
    }

    /// Load a JSON roster file
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Find a participant by registration id (surrounding whitespace ignored)
    pub fn lookup(&self, registration_id: &str) -> Option<&ParticipantRecord> {
        self.records.get(registration_id.trim())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows excluded for missing/blank key fields
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Rows ignored because their id was already present
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}
