// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Types shared by the submission and authentication pipeline. All types
//! derive `Serialize`/`Deserialize` so they can be persisted locally and
//! carried over the wire.
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype wraps Ethereum-style addresses (0x-prefixed,
//! 40 hex characters), always normalized to lowercase.
//!
//! ## Model Categories
//!
//! - **Evidence**: [`MediaFile`], [`MediaRef`], [`ContentId`]
//! - **Reports**: [`ReportDraft`], [`Report`], [`ReportStatus`]
//! - **Classification**: [`Category`], [`Severity`]

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Lowercase Ethereum-compatible wallet address.
///
/// Construct with [`WalletAddress::parse`]; the inner string is guaranteed
/// to be `0x` followed by 40 lowercase hexadecimal characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and normalize an address.
    ///
    /// Returns `None` unless the input is `0x` + 40 hex digits (any case).
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        WalletAddress::parse(&value).ok_or_else(|| format!("invalid wallet address: {value}"))
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Content Identifiers
// =============================================================================

/// Identifier assigned by the content-addressed store (e.g. an IPFS CID).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        ContentId(value.to_string())
    }
}

// =============================================================================
// Classification
// =============================================================================

/// What kind of violation a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    IllegalMining,
    EnvironmentalDamage,
    SafetyViolation,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::IllegalMining => "illegal_mining",
            Category::EnvironmentalDamage => "environmental_damage",
            Category::SafetyViolation => "safety_violation",
            Category::Other => "other",
        }
    }
}

/// Reporter-assessed severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Review state of a report. Owned by the server; the client starts at
/// `Pending` and only follows server-driven corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ReportStatus {
    /// Parse a server status string (case-insensitive).
    pub fn from_server(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ReportStatus::Pending),
            "under_review" | "in_review" => Some(ReportStatus::UnderReview),
            "approved" => Some(ReportStatus::Approved),
            "rejected" => Some(ReportStatus::Rejected),
            _ => None,
        }
    }
}

// =============================================================================
// Location
// =============================================================================

/// Where the reported activity was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }
}

// =============================================================================
// Media
// =============================================================================

/// Media kind, which selects the size limit and MIME allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Embedded capture metadata (EXIF or equivalent), when available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExifData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
}

/// A captured or selected evidence file that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MediaFile {
    /// Local resource handle (`file://` URI or filesystem path).
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub file_name: String,
    /// Size in bytes.
    pub file_size: u64,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif_data: Option<ExifData>,
}

/// An uploaded media file, referenced by its content id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub content_id: ContentId,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub file_name: String,
}

// =============================================================================
// Reports
// =============================================================================

/// User-supplied report data, before anything has been uploaded.
///
/// `location` is optional here so a missing location can be reported as a
/// validation failure rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportDraft {
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub media_files: Vec<MediaFile>,
}

/// A report that has been anchored by the ledger service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Ledger-assigned id, or a `local-` placeholder when none was returned.
    pub id: String,
    /// Content id of the composed metadata document.
    pub metadata_content_id: ContentId,
    pub transaction_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_report_id: Option<u64>,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub location: Location,
    pub media_files: Vec<MediaRef>,
    pub reporter_address: WalletAddress,
    pub timestamp: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

/// Placeholder id prefix for reports whose ledger receipt carried no id.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Generate a locally unique placeholder report id.
pub fn local_report_id() -> String {
    format!("{LOCAL_ID_PREFIX}{}", uuid::Uuid::new_v4())
}
