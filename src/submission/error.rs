// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Submission failures, tagged with the stage they occurred in.

use crate::content::UploadError;
use crate::ledger::SubmitError;
use crate::models::ContentId;
use crate::validation::ValidationError;

use super::stage::SubmissionStage;

/// Terminal failure of a report submission.
///
/// Every variant past validation carries the content ids that were
/// already pinned, so callers and operators can see what was left behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("upload of {file_name} failed: {cause}")]
    MediaUploadFailed {
        file_name: String,
        uploaded: Vec<ContentId>,
        cause: UploadError,
    },

    #[error("could not compose report metadata: {reason}")]
    Composition {
        uploaded: Vec<ContentId>,
        reason: String,
    },

    #[error("metadata upload failed: {cause}")]
    MetadataUploadFailed {
        uploaded: Vec<ContentId>,
        cause: UploadError,
    },

    #[error("on-chain submission failed: {cause}")]
    OnChainSubmitFailed {
        media: Vec<ContentId>,
        metadata: ContentId,
        cause: SubmitError,
    },

    #[error("submission cancelled during {stage}")]
    Cancelled {
        stage: SubmissionStage,
        uploaded: Vec<ContentId>,
    },
}

impl SubmissionError {
    pub fn stage(&self) -> SubmissionStage {
        match self {
            SubmissionError::Validation(_) => SubmissionStage::Validating,
            SubmissionError::MediaUploadFailed { .. } => SubmissionStage::UploadingMedia,
            SubmissionError::Composition { .. } => SubmissionStage::ComposingMetadata,
            SubmissionError::MetadataUploadFailed { .. } => SubmissionStage::UploadingMetadata,
            SubmissionError::OnChainSubmitFailed { .. } => SubmissionStage::SubmittingOnChain,
            SubmissionError::Cancelled { stage, .. } => *stage,
        }
    }

    /// The ledger call was issued but its outcome is unknown.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, SubmissionError::OnChainSubmitFailed { cause, .. } if cause.is_ambiguous())
    }

    pub fn requires_reauthentication(&self) -> bool {
        match self {
            SubmissionError::MediaUploadFailed { cause, .. }
            | SubmissionError::MetadataUploadFailed { cause, .. } => {
                matches!(cause, UploadError::Unauthorized(_))
            }
            SubmissionError::OnChainSubmitFailed { cause, .. } => {
                matches!(cause, SubmitError::Unauthorized(_))
            }
            _ => false,
        }
    }

    /// Content pinned before the failure and referenced by no report.
    ///
    /// For an ambiguous ledger failure these may in fact be referenced.
    pub fn orphaned_content(&self) -> Vec<ContentId> {
        match self {
            SubmissionError::Validation(_) => Vec::new(),
            SubmissionError::MediaUploadFailed { uploaded, .. }
            | SubmissionError::Composition { uploaded, .. }
            | SubmissionError::MetadataUploadFailed { uploaded, .. }
            | SubmissionError::Cancelled { uploaded, .. } => uploaded.clone(),
            SubmissionError::OnChainSubmitFailed {
                media, metadata, ..
            } => {
                let mut all = media.clone();
                all.push(metadata.clone());
                all
            }
        }
    }
}
