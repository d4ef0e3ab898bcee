// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded report database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `reports`: report id → serialized Report (JSON bytes)
//! - `report_order`: inverted append sequence → report id
//! - `report_meta`: key → value (`next_seq` as u64 big-endian)
//!
//! Forward scans of `report_order` yield newest-first order.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::models::Report;

// =============================================================================
// Table Definitions
// =============================================================================

const REPORTS: TableDefinition<&str, &[u8]> = TableDefinition::new("reports");

/// Key is `u64::MAX - seq` so the newest append sorts first.
const REPORT_ORDER: TableDefinition<u64, &str> = TableDefinition::new("report_order");

const REPORT_META: TableDefinition<&str, &[u8]> = TableDefinition::new("report_meta");

const NEXT_SEQ_KEY: &str = "next_seq";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReportDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReportDbResult<T> = Result<T, ReportDbError>;

fn decode_seq(bytes: &[u8]) -> u64 {
    match <[u8; 8]>::try_from(bytes) {
        Ok(raw) => u64::from_be_bytes(raw),
        Err(_) => 0,
    }
}

// =============================================================================
// ReportDatabase
// =============================================================================

/// Durable store for the local report collection.
pub struct ReportDatabase {
    db: Database,
}

impl ReportDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> ReportDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(REPORTS)?;
            let _ = write_txn.open_table(REPORT_ORDER)?;
            let _ = write_txn.open_table(REPORT_META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Append a report as the newest entry.
    ///
    /// If the id is already stored only the record is replaced; its
    /// position in the ordering is kept.
    pub fn append(&self, report: &Report) -> ReportDbResult<()> {
        let json = serde_json::to_vec(report)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut reports = write_txn.open_table(REPORTS)?;
            let existed = reports.get(report.id.as_str())?.is_some();
            reports.insert(report.id.as_str(), json.as_slice())?;

            if !existed {
                let mut meta = write_txn.open_table(REPORT_META)?;
                let seq = match meta.get(NEXT_SEQ_KEY)? {
                    Some(v) => decode_seq(v.value()),
                    None => 0,
                };
                meta.insert(NEXT_SEQ_KEY, seq.wrapping_add(1).to_be_bytes().as_slice())?;

                let mut order = write_txn.open_table(REPORT_ORDER)?;
                order.insert(u64::MAX - seq, report.id.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Replace the record of an already-stored report.
    ///
    /// Returns `false` (and writes nothing) if the id is unknown.
    pub fn update(&self, report: &Report) -> ReportDbResult<bool> {
        let json = serde_json::to_vec(report)?;

        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut reports = write_txn.open_table(REPORTS)?;
            let existed = reports.get(report.id.as_str())?.is_some();
            if existed {
                reports.insert(report.id.as_str(), json.as_slice())?;
            }
            existed
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Look up a single report by id.
    pub fn get(&self, id: &str) -> ReportDbResult<Option<Report>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REPORTS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All stored reports, newest first.
    pub fn list_newest_first(&self) -> ReportDbResult<Vec<Report>> {
        let read_txn = self.db.begin_read()?;
        let order = read_txn.open_table(REPORT_ORDER)?;
        let reports = read_txn.open_table(REPORTS)?;

        let mut results = Vec::new();
        for entry in order.iter()? {
            let entry = entry?;
            let id = entry.1.value().to_string();
            match reports.get(id.as_str())? {
                Some(value) => match serde_json::from_slice::<Report>(value.value()) {
                    Ok(report) => results.push(report),
                    Err(e) => {
                        tracing::warn!(report_id = %id, error = %e, "Skipping unreadable report record");
                    }
                },
                None => {
                    tracing::warn!(report_id = %id, "Order index references a missing report");
                }
            }
        }
        Ok(results)
    }
}
