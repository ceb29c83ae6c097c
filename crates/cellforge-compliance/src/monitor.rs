//! The compliance monitor: an append-only log of task outcomes.
//!
//! # Design
//!
//! - **Append-only**: records are never modified or deleted.
//! - **Per-entity order**: each entity's records keep insertion order.
//! - **Global order**: every record carries a sequence number so that
//!   violations can be reported in the order they were recorded, across
//!   entities.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use cellforge_types::{ComplianceRecord, ComplianceStatus, EntityId, Task};

use crate::ComplianceError;

/// A non-completed record surfaced by [`ComplianceMonitor::verdict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The entity the record belongs to.
    pub entity_id: EntityId,
    /// The task that did not complete.
    pub task: Task,
    /// The recorded status (`pending` or `failed`).
    pub status: ComplianceStatus,
    /// The recorded error message, if any.
    pub error: Option<String>,
}

/// Population-wide compliance verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// `true` iff every record is `completed`.
    pub compliant: bool,
    /// Every non-completed record in recording order.
    pub violations: Vec<Violation>,
}

/// Append-only record of task outcomes, keyed by entity id.
#[derive(Debug, Default, Clone)]
pub struct ComplianceMonitor {
    /// Records per entity, in insertion order.
    records: BTreeMap<EntityId, Vec<ComplianceRecord>>,
    /// Sequence number for the next record.
    next_sequence: u64,
}

impl ComplianceMonitor {
    /// Create an empty monitor.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    /// Rebuild a monitor from a persisted record map.
    ///
    /// Per-entity order and timestamps are kept as given. New records will
    /// continue numbering after the highest imported sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::DuplicateSequence`] if two records share
    /// a sequence number.
    pub fn from_records(
        records: BTreeMap<EntityId, Vec<ComplianceRecord>>,
    ) -> Result<Self, ComplianceError> {
        let mut seen = BTreeSet::new();
        for record in records.values().flatten() {
            if !seen.insert(record.sequence) {
                return Err(ComplianceError::DuplicateSequence {
                    sequence: record.sequence,
                });
            }
        }
        let next_sequence = seen
            .last()
            .map_or(0, |highest| highest.saturating_add(1));

        Ok(Self {
            records,
            next_sequence,
        })
    }

    /// Load a report previously written by [`export`](Self::export).
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Io`] if the file cannot be opened,
    /// [`ComplianceError::Serialization`] if it is not a record map, and
    /// [`ComplianceError::DuplicateSequence`] if two records share a
    /// sequence number.
    pub fn load(source: &Path) -> Result<Self, ComplianceError> {
        let file = File::open(source).map_err(|e| ComplianceError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        let records: BTreeMap<EntityId, Vec<ComplianceRecord>> =
            serde_json::from_reader(BufReader::new(file))?;
        Self::from_records(records)
    }

    /// Total number of records across all entities.
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.values().all(Vec::is_empty)
    }

    /// Append a timestamped record for `entity_id`.
    ///
    /// Returns the sequence number assigned to the record.
    pub fn record(
        &mut self,
        entity_id: &EntityId,
        task: &Task,
        status: ComplianceStatus,
        error: Option<String>,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);

        match status {
            ComplianceStatus::Completed => {
                debug!(%entity_id, %task, sequence, "Task completed");
            }
            ComplianceStatus::Pending | ComplianceStatus::Failed => {
                warn!(
                    %entity_id,
                    %task,
                    ?status,
                    error = error.as_deref().unwrap_or(""),
                    sequence,
                    "Task not completed"
                );
            }
        }

        self.records
            .entry(entity_id.clone())
            .or_default()
            .push(ComplianceRecord {
                sequence,
                task: task.clone(),
                status,
                timestamp: Utc::now(),
                error_message: error,
            });

        sequence
    }

    /// Records for one entity, oldest first.
    pub fn records_for(&self, entity_id: &EntityId) -> &[ComplianceRecord] {
        self.records
            .get(entity_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The full record map.
    pub const fn records(&self) -> &BTreeMap<EntityId, Vec<ComplianceRecord>> {
        &self.records
    }

    /// Compute the population-wide verdict from the current log.
    pub fn verdict(&self) -> Verdict {
        let mut flagged: Vec<(u64, Violation)> = self
            .records
            .iter()
            .flat_map(|(entity_id, records)| {
                records
                    .iter()
                    .filter(|r| r.status != ComplianceStatus::Completed)
                    .map(move |r| {
                        (
                            r.sequence,
                            Violation {
                                entity_id: entity_id.clone(),
                                task: r.task.clone(),
                                status: r.status,
                                error: r.error_message.clone(),
                            },
                        )
                    })
            })
            .collect();
        flagged.sort_by_key(|(sequence, _)| *sequence);

        let violations: Vec<Violation> = flagged.into_iter().map(|(_, v)| v).collect();
        Verdict {
            compliant: violations.is_empty(),
            violations,
        }
    }

    /// Serialize the full record map as pretty JSON into `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Serialization`] if encoding or writing
    /// fails.
    pub fn export_to_writer(&self, writer: impl Write) -> Result<(), ComplianceError> {
        serde_json::to_writer_pretty(writer, &self.records)?;
        Ok(())
    }

    /// Write the full record map to `destination` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Io`] if the file cannot be created or
    /// flushed, and [`ComplianceError::Serialization`] if encoding fails.
    pub fn export(&self, destination: &Path) -> Result<(), ComplianceError> {
        let io_err = |e| ComplianceError::Io {
            path: destination.to_path_buf(),
            source: e,
        };
        let file = File::create(destination).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.export_to_writer(&mut writer)?;
        writer.flush().map_err(io_err)?;

        info!(
            path = %destination.display(),
            records = self.len(),
            "Compliance report exported"
        );
        Ok(())
    }
}
