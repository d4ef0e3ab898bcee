// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local validation rules applied before any network call.

use crate::models::{Location, MediaFile, MediaKind, ReportDraft, WalletAddress};

pub const MIN_DESCRIPTION_CHARS: usize = 20;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_MEDIA_FILES: usize = 5;
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: u64 = 50 * 1024 * 1024;
pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_PASSWORD_CHARS: usize = 100;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];
pub const ALLOWED_VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];

/// Which input failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Description,
    Location,
    MediaFiles,
    WalletAddress,
    Email,
    Password,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Description => "description",
            Field::Location => "location",
            Field::MediaFiles => "mediaFiles",
            Field::WalletAddress => "walletAddress",
            Field::Email => "email",
            Field::Password => "password",
        };
        f.write_str(name)
    }
}

/// A local validation failure. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::new(Field::Description, "description is required"));
    }
    if description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(ValidationError::new(
            Field::Description,
            format!("must be at least {MIN_DESCRIPTION_CHARS} characters"),
        ));
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::new(
            Field::Description,
            format!("must not exceed {MAX_DESCRIPTION_CHARS} characters"),
        ));
    }
    Ok(())
}

/// Latitude in [-90, 90], longitude in [-180, 180], both finite.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

pub fn validate_location(location: Option<&Location>) -> Result<&Location, ValidationError> {
    let location =
        location.ok_or_else(|| ValidationError::new(Field::Location, "location is required"))?;
    if !validate_coordinates(location.latitude, location.longitude) {
        return Err(ValidationError::new(
            Field::Location,
            format!(
                "coordinates out of range: ({}, {})",
                location.latitude, location.longitude
            ),
        ));
    }
    Ok(location)
}

/// Upper bound on the byte size of one media file of `kind`.
pub fn max_media_bytes(kind: MediaKind) -> u64 {
    match kind {
        MediaKind::Image => MAX_IMAGE_BYTES,
        MediaKind::Video => MAX_VIDEO_BYTES,
    }
}

pub fn validate_media_file(file: &MediaFile) -> Result<(), ValidationError> {
    let (allowed, label) = match file.kind {
        MediaKind::Image => (ALLOWED_IMAGE_TYPES, "image"),
        MediaKind::Video => (ALLOWED_VIDEO_TYPES, "video"),
    };
    let max_bytes = max_media_bytes(file.kind);

    let mime = file.mime_type.trim().to_ascii_lowercase();
    if !allowed.contains(&mime.as_str()) {
        return Err(ValidationError::new(
            Field::MediaFiles,
            format!("{}: unsupported {label} format {}", file.file_name, file.mime_type),
        ));
    }
    if file.file_size > max_bytes {
        return Err(ValidationError::new(
            Field::MediaFiles,
            format!(
                "{}: {label} size exceeds {}MB limit",
                file.file_name,
                max_bytes / (1024 * 1024)
            ),
        ));
    }
    Ok(())
}

pub fn validate_wallet_address(raw: &str) -> Result<WalletAddress, ValidationError> {
    WalletAddress::parse(raw)
        .ok_or_else(|| ValidationError::new(Field::WalletAddress, "expected 0x followed by 40 hex characters"))
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(ValidationError::new(Field::Email, "not an email address")),
    }
    let len = password.chars().count();
    if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&len) {
        return Err(ValidationError::new(
            Field::Password,
            format!("must be {MIN_PASSWORD_CHARS}-{MAX_PASSWORD_CHARS} characters"),
        ));
    }
    Ok(())
}

/// Validate a whole draft plus the reporter identity.
///
/// Checks run in a fixed order: description, location, media, wallet.
pub fn validate_draft(
    draft: &ReportDraft,
    reporter: Option<&WalletAddress>,
) -> Result<(), ValidationError> {
    validate_description(&draft.description)?;
    validate_location(draft.location.as_ref())?;

    if draft.media_files.is_empty() {
        return Err(ValidationError::new(
            Field::MediaFiles,
            "at least one photo or video is required",
        ));
    }
    if draft.media_files.len() > MAX_MEDIA_FILES {
        return Err(ValidationError::new(
            Field::MediaFiles,
            format!("at most {MAX_MEDIA_FILES} files may be attached"),
        ));
    }
    for file in &draft.media_files {
        validate_media_file(file)?;
    }

    if reporter.is_none() {
        return Err(ValidationError::new(
            Field::WalletAddress,
            "connect a wallet before submitting",
        ));
    }
    Ok(())
}
