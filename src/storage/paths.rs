// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the local storage layout.

use std::path::{Path, PathBuf};

/// Default root directory for local persistent state.
pub const DATA_ROOT: &str = "./mineguard-data";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all local data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Session Paths ==========

    /// Directory holding identity state.
    pub fn session_dir(&self) -> PathBuf {
        self.root.join("session")
    }

    /// Path to the persisted session record.
    pub fn session_file(&self) -> PathBuf {
        self.session_dir().join("session.json")
    }

    // ========== Report Paths ==========

    /// Directory holding the local report collection.
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    /// Path to the embedded report database.
    pub fn reports_db(&self) -> PathBuf {
        self.reports_dir().join("reports.redb")
    }
}
