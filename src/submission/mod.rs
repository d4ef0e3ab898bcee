// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Report Submission
//!
//! Turns a [`ReportDraft`](crate::models::ReportDraft) into an anchored
//! [`Report`](crate::models::Report): validate, pin media, pin metadata,
//! submit to the ledger, record locally.

pub mod coordinator;
pub mod error;
pub mod metadata;
pub mod stage;

pub use coordinator::ReportSubmissionCoordinator;
pub use error::SubmissionError;
pub use metadata::MetadataDocument;
pub use stage::SubmissionStage;
