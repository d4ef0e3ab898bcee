// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Report metadata document pinned alongside the media.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Category, Location, MediaRef, ReportDraft, Severity};

/// The JSON document whose content id is anchored on the ledger.
///
/// Field order is fixed so identical inputs always serialize to identical
/// bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub location: Location,
    pub media_files: Vec<MediaRef>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl MetadataDocument {
    /// Build the document from a validated draft and its uploaded media.
    pub fn compose(
        draft: &ReportDraft,
        location: &Location,
        media: &[MediaRef],
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            description: draft.description.trim().to_string(),
            category: draft.category,
            severity: draft.severity,
            location: location.clone(),
            media_files: media.to_vec(),
            timestamp: timestamp.timestamp_millis(),
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
