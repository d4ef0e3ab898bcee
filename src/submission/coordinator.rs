// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Report submission state machine.
//!
//! ## Pipeline
//!
//! ```text
//! Validating -> UploadingMedia -> ComposingMetadata -> UploadingMetadata
//!            -> SubmittingOnChain -> Reconciling -> Done
//! ```
//!
//! Each stage starts only after the previous one has returned. Media files
//! are uploaded one at a time in attachment order. The ledger is called
//! exactly once per submission and never retried; once that call has been
//! issued cancellation is no longer observed.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::error::SubmissionError;
use super::metadata::MetadataDocument;
use super::stage::SubmissionStage;
use crate::content::{ContentStore, MediaSource, UploadError};
use crate::ledger::{LedgerApi, LedgerMediaRef, LedgerSubmission};
use crate::models::{
    local_report_id, ContentId, MediaFile, MediaRef, Report, ReportDraft, ReportStatus,
};
use crate::reconciler::LocalReportReconciler;
use crate::session::SessionStore;
use crate::validation::{
    max_media_bytes, validate_draft, validate_location, Field, ValidationError,
};

pub struct ReportSubmissionCoordinator {
    content: Arc<dyn ContentStore>,
    ledger: Arc<dyn LedgerApi>,
    media: Arc<dyn MediaSource>,
    session: SessionStore,
    reports: Arc<LocalReportReconciler>,
}

fn enter(progress: &watch::Sender<SubmissionStage>, stage: SubmissionStage) {
    progress.send_replace(stage);
    info!(stage = %stage, "Submission stage");
}

fn content_ids(media: &[MediaRef]) -> Vec<ContentId> {
    media.iter().map(|m| m.content_id.clone()).collect()
}

/// The declared `file_size` is not trusted; the loaded bytes are checked.
fn check_loaded_size(file: &MediaFile, bytes: &[u8]) -> Result<(), UploadError> {
    let limit = max_media_bytes(file.kind);
    let loaded = bytes.len() as u64;
    if loaded > limit {
        return Err(UploadError::PayloadRejected {
            status: 413,
            detail: format!(
                "{} is {loaded} bytes, limit is {limit} (declared {})",
                file.file_name, file.file_size
            ),
        });
    }
    Ok(())
}

fn log_orphans(err: &SubmissionError) {
    let orphaned = err.orphaned_content();
    if !orphaned.is_empty() {
        let ids: Vec<&str> = orphaned.iter().map(ContentId::as_str).collect();
        warn!(stage = %err.stage(), orphaned = ?ids, "Submission failed after content was pinned");
    }
}

impl ReportSubmissionCoordinator {
    pub fn new(
        content: Arc<dyn ContentStore>,
        ledger: Arc<dyn LedgerApi>,
        media: Arc<dyn MediaSource>,
        session: SessionStore,
        reports: Arc<LocalReportReconciler>,
    ) -> Self {
        Self {
            content,
            ledger,
            media,
            session,
            reports,
        }
    }

    /// Submit without progress reporting or cancellation.
    pub async fn submit(&self, draft: ReportDraft) -> Result<Report, SubmissionError> {
        let (progress, _) = watch::channel(SubmissionStage::Validating);
        self.submit_tracked(draft, &CancellationToken::new(), &progress)
            .await
    }

    /// Submit, publishing each stage on `progress`.
    ///
    /// Cancelling `cancel` before the ledger call aborts with
    /// [`SubmissionError::Cancelled`]; after it, the submission runs to
    /// completion.
    pub async fn submit_tracked(
        &self,
        draft: ReportDraft,
        cancel: &CancellationToken,
        progress: &watch::Sender<SubmissionStage>,
    ) -> Result<Report, SubmissionError> {
        let result = self.run(draft, cancel, progress).await;
        match &result {
            Ok(report) => info!(report_id = %report.id, tx = %report.transaction_ref, "Report submitted"),
            Err(err) => {
                warn!(stage = %err.stage(), error = %err, "Report submission failed");
                log_orphans(err);
            }
        }
        result
    }

    async fn run(
        &self,
        draft: ReportDraft,
        cancel: &CancellationToken,
        progress: &watch::Sender<SubmissionStage>,
    ) -> Result<Report, SubmissionError> {
        let cancelled = |stage: SubmissionStage, media: &[MediaRef]| SubmissionError::Cancelled {
            stage,
            uploaded: content_ids(media),
        };
        let cancel_requested =
            |stage: SubmissionStage| cancel.is_cancelled() && !stage.is_past_point_of_no_return();

        // Validating
        enter(progress, SubmissionStage::Validating);
        if cancel_requested(SubmissionStage::Validating) {
            return Err(cancelled(SubmissionStage::Validating, &[]));
        }
        let reporter = self.session.get().await.wallet_address;
        validate_draft(&draft, reporter.as_ref())?;
        let location = validate_location(draft.location.as_ref())?.clone();
        let reporter = reporter.ok_or_else(|| {
            ValidationError::new(Field::WalletAddress, "connect a wallet before submitting")
        })?;

        // UploadingMedia
        enter(progress, SubmissionStage::UploadingMedia);
        let mut uploaded: Vec<MediaRef> = Vec::with_capacity(draft.media_files.len());
        for file in &draft.media_files {
            let upload = async {
                let bytes = self.media.load(&file.uri).await?;
                check_loaded_size(file, &bytes)?;
                self.content
                    .upload_media(bytes, &file.file_name, &file.mime_type)
                    .await
            };
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = upload => Some(result),
            };
            let content_id = match outcome {
                None => return Err(cancelled(SubmissionStage::UploadingMedia, &uploaded)),
                Some(Ok(content_id)) => content_id,
                Some(Err(cause)) => {
                    return Err(SubmissionError::MediaUploadFailed {
                        file_name: file.file_name.clone(),
                        uploaded: content_ids(&uploaded),
                        cause,
                    })
                }
            };
            info!(
                file_name = %file.file_name,
                content_id = %content_id,
                index = uploaded.len() + 1,
                total = draft.media_files.len(),
                "Media uploaded"
            );
            uploaded.push(MediaRef {
                content_id,
                kind: file.kind,
                file_name: file.file_name.clone(),
            });
        }

        // ComposingMetadata
        enter(progress, SubmissionStage::ComposingMetadata);
        if cancel_requested(SubmissionStage::ComposingMetadata) {
            return Err(cancelled(SubmissionStage::ComposingMetadata, &uploaded));
        }
        let timestamp = Utc::now();
        let document = MetadataDocument::compose(&draft, &location, &uploaded, timestamp);
        let json = document
            .to_json()
            .map_err(|e| SubmissionError::Composition {
                uploaded: content_ids(&uploaded),
                reason: e.to_string(),
            })?;

        // UploadingMetadata
        enter(progress, SubmissionStage::UploadingMetadata);
        let outcome: Option<Result<ContentId, UploadError>> = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.content.upload_metadata(&json) => Some(result),
        };
        let metadata_id = match outcome {
            None => return Err(cancelled(SubmissionStage::UploadingMetadata, &uploaded)),
            Some(Ok(id)) => id,
            Some(Err(cause)) => {
                return Err(SubmissionError::MetadataUploadFailed {
                    uploaded: content_ids(&uploaded),
                    cause,
                })
            }
        };

        // SubmittingOnChain
        if cancel_requested(SubmissionStage::UploadingMetadata) {
            let mut pinned = content_ids(&uploaded);
            pinned.push(metadata_id);
            return Err(SubmissionError::Cancelled {
                stage: SubmissionStage::UploadingMetadata,
                uploaded: pinned,
            });
        }
        enter(progress, SubmissionStage::SubmittingOnChain);
        let submission = LedgerSubmission {
            metadata_content_id: metadata_id.clone(),
            severity: document.severity,
            category: document.category,
            description: document.description.clone(),
            location: location.clone(),
            media_refs: uploaded.iter().map(LedgerMediaRef::from).collect(),
        };
        let receipt = self.ledger.submit(&submission).await.map_err(|cause| {
            SubmissionError::OnChainSubmitFailed {
                media: content_ids(&uploaded),
                metadata: metadata_id.clone(),
                cause,
            }
        })?;

        // Reconciling
        enter(progress, SubmissionStage::Reconciling);
        let id = receipt.report_id.clone().unwrap_or_else(local_report_id);
        if receipt.report_id.is_none() {
            warn!(report_id = %id, tx = %receipt.transaction_ref, "Ledger returned no report id; using placeholder");
        }
        let report = Report {
            id,
            metadata_content_id: metadata_id,
            transaction_ref: receipt.transaction_ref,
            contract_report_id: receipt.contract_report_id,
            description: document.description,
            category: document.category,
            severity: document.severity,
            location,
            media_files: uploaded,
            reporter_address: reporter,
            timestamp,
            status: ReportStatus::Pending,
            reward_amount: None,
            admin_notes: None,
        };
        self.reports.append(report.clone());

        enter(progress, SubmissionStage::Done);
        Ok(report)
    }
}
