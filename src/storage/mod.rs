// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Storage Module
//!
//! Persistent client-side state under a single data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! {data_dir}/
//!   session/
//!     session.json    # Wallet address, bearer credential, role
//!   reports/
//!     reports.redb    # Local report collection (newest first)
//! ```
//!
//! ## Important Notes
//!
//! - The bearer credential is stored in plain JSON; protect the data
//!   directory with filesystem permissions
//! - A partially completed wallet login is never written here

pub mod local_fs;
pub mod paths;
pub mod report_db;

pub use local_fs::{LocalStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use report_db::{ReportDatabase, ReportDbError, ReportDbResult};
