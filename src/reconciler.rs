// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local report collection.
//!
//! Newest-first, keyed by report id. Reports enter through [`append`]
//! after a successful ledger submission and are only ever corrected
//! afterwards, never removed.
//!
//! The in-memory collection is authoritative for readers. When a
//! [`ReportDatabase`] is attached every mutation is written through to it;
//! a failed write is logged and the collection carries on in memory.
//!
//! [`append`]: LocalReportReconciler::append

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::ledger::ServerReport;
use crate::models::{Report, ReportStatus};
use crate::storage::ReportDatabase;

pub struct LocalReportReconciler {
    reports: Mutex<Vec<Report>>,
    db: Option<Arc<ReportDatabase>>,
}

impl LocalReportReconciler {
    pub fn in_memory() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            db: None,
        }
    }

    /// Load the persisted collection and write through to `db` from now on.
    pub fn open(db: Arc<ReportDatabase>) -> Self {
        let reports = match db.list_newest_first() {
            Ok(reports) => reports,
            Err(e) => {
                warn!(error = %e, "Could not load persisted reports; starting empty");
                Vec::new()
            }
        };
        info!(count = reports.len(), "Loaded local reports");
        Self {
            reports: Mutex::new(reports),
            db: Some(db),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Report>> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist_append(&self, report: &Report) {
        if let Some(db) = &self.db {
            if let Err(e) = db.append(report) {
                warn!(report_id = %report.id, error = %e, "Failed to persist report");
            }
        }
    }

    fn persist_update(&self, report: &Report) {
        if let Some(db) = &self.db {
            if let Err(e) = db.update(report) {
                warn!(report_id = %report.id, error = %e, "Failed to persist report update");
            }
        }
    }

    /// Add a report as the newest entry. A report whose id is already
    /// present replaces that entry in place.
    pub fn append(&self, report: Report) {
        let mut reports = self.lock();
        self.persist_append(&report);
        match reports.iter_mut().find(|r| r.id == report.id) {
            Some(existing) => *existing = report,
            None => reports.insert(0, report),
        }
    }

    /// Returns `false` (and changes nothing) for an unknown id.
    pub fn update_status(&self, id: &str, status: ReportStatus) -> bool {
        let mut reports = self.lock();
        let Some(report) = reports.iter_mut().find(|r| r.id == id) else {
            debug!(report_id = %id, "Status update for unknown report ignored");
            return false;
        };
        if report.status != status {
            report.status = status;
            self.persist_update(report);
        }
        true
    }

    pub fn all(&self) -> Vec<Report> {
        self.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<Report> {
        self.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Apply server-side status, reward and review notes to known reports.
    ///
    /// Server reports are matched by id, falling back to the metadata
    /// content id for reports that only carry a local placeholder id.
    /// Unknown reports are ignored. Returns how many local entries changed.
    pub fn apply_server_state(&self, server_reports: &[ServerReport]) -> usize {
        let mut reports = self.lock();
        let mut changed = 0;

        for server in server_reports {
            let matched = reports.iter_mut().find(|r| {
                r.id == server.id
                    || server
                        .ipfs_hash
                        .as_deref()
                        .is_some_and(|hash| r.metadata_content_id.as_str() == hash)
            });
            let Some(report) = matched else {
                continue;
            };

            let mut dirty = false;
            if let Some(status) = server.status() {
                if report.status != status {
                    report.status = status;
                    dirty = true;
                }
            }
            if server.reward_amount.is_some() && report.reward_amount != server.reward_amount {
                report.reward_amount = server.reward_amount;
                dirty = true;
            }
            if server.admin_notes.is_some() && report.admin_notes != server.admin_notes {
                report.admin_notes = server.admin_notes.clone();
                dirty = true;
            }

            if dirty {
                debug!(report_id = %report.id, status = ?report.status, "Applied server state");
                self.persist_update(report);
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ContentId, Location, Severity, WalletAddress};
    use chrono::Utc;

    fn report(id: &str, metadata: &str) -> Report {
        Report {
            id: id.to_string(),
            metadata_content_id: ContentId::from(metadata),
            transaction_ref: format!("0xtx-{id}"),
            contract_report_id: None,
            description: "Excavation beyond lease boundary near river".to_string(),
            category: Category::IllegalMining,
            severity: Severity::High,
            location: Location::new(23.79, 86.43),
            media_files: Vec::new(),
            reporter_address: WalletAddress::parse("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
                .unwrap(),
            timestamp: Utc::now(),
            status: ReportStatus::Pending,
            reward_amount: None,
            admin_notes: None,
        }
    }

    fn server(id: &str, status: &str) -> ServerReport {
        ServerReport {
            id: id.to_string(),
            ipfs_hash: None,
            status: status.to_string(),
            reward_amount: None,
            reward_claimed: false,
            transaction_hash: None,
            admin_notes: None,
        }
    }

    #[test]
    fn newest_first_and_replace_in_place() {
        let reconciler = LocalReportReconciler::in_memory();
        reconciler.append(report("a", "QmA"));
        reconciler.append(report("b", "QmB"));

        let ids: Vec<String> = reconciler.all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let mut replacement = report("a", "QmA");
        replacement.transaction_ref = "0xreplaced".to_string();
        reconciler.append(replacement);
        let all = reconciler.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].transaction_ref, "0xreplaced");
    }

    #[test]
    fn update_status_of_unknown_id_is_a_no_op() {
        let reconciler = LocalReportReconciler::in_memory();
        reconciler.append(report("a", "QmA"));
        assert!(!reconciler.update_status("missing", ReportStatus::Approved));
        assert!(reconciler.update_status("a", ReportStatus::UnderReview));
        assert_eq!(reconciler.get("a").unwrap().status, ReportStatus::UnderReview);
        assert_eq!(reconciler.len(), 1);
    }

    #[test]
    fn server_state_corrects_known_reports() {
        let reconciler = LocalReportReconciler::in_memory();
        reconciler.append(report("r-1", "QmA"));
        reconciler.append(report("local-xyz", "QmB"));

        let mut approved = server("r-1", "approved");
        approved.reward_amount = Some(0.5);
        approved.admin_notes = Some("High quality evidence".to_string());
        let mut by_hash = server("r-2", "rejected");
        by_hash.ipfs_hash = Some("QmB".to_string());

        let changed =
            reconciler.apply_server_state(&[approved, by_hash, server("r-9", "approved")]);
        assert_eq!(changed, 2);

        let r1 = reconciler.get("r-1").unwrap();
        assert_eq!(r1.status, ReportStatus::Approved);
        assert_eq!(r1.reward_amount, Some(0.5));
        assert_eq!(reconciler.get("local-xyz").unwrap().status, ReportStatus::Rejected);
        assert!(reconciler.get("r-9").is_none());

        // Unchanged state is not counted twice.
        assert_eq!(reconciler.apply_server_state(&[server("r-1", "approved")]), 0);
    }

    #[test]
    fn unrecognised_server_status_is_ignored() {
        let reconciler = LocalReportReconciler::in_memory();
        reconciler.append(report("r-1", "QmA"));
        assert_eq!(reconciler.apply_server_state(&[server("r-1", "escalated")]), 0);
        assert_eq!(reconciler.get("r-1").unwrap().status, ReportStatus::Pending);
    }

    #[test]
    fn collection_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.redb");

        {
            let reconciler = LocalReportReconciler::open(Arc::new(ReportDatabase::open(&path).unwrap()));
            reconciler.append(report("a", "QmA"));
            reconciler.append(report("b", "QmB"));
            reconciler.update_status("a", ReportStatus::Approved);
        }

        let reopened = LocalReportReconciler::open(Arc::new(ReportDatabase::open(&path).unwrap()));
        let all = reopened.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "b");
        assert_eq!(all[1].status, ReportStatus::Approved);
    }
}
