// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a submission in its pipeline.
///
/// Stages only ever advance in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStage {
    Validating,
    UploadingMedia,
    ComposingMetadata,
    UploadingMetadata,
    SubmittingOnChain,
    Reconciling,
    Done,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStage::Validating => "validating",
            SubmissionStage::UploadingMedia => "uploading_media",
            SubmissionStage::ComposingMetadata => "composing_metadata",
            SubmissionStage::UploadingMetadata => "uploading_metadata",
            SubmissionStage::SubmittingOnChain => "submitting_on_chain",
            SubmissionStage::Reconciling => "reconciling",
            SubmissionStage::Done => "done",
        }
    }

    /// Whether the ledger call may already have been issued.
    pub fn is_past_point_of_no_return(&self) -> bool {
        *self >= SubmissionStage::SubmittingOnChain
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
