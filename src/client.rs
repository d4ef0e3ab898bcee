// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client Facade
//!
//! [`MineGuardClient`] wires the session store, identity, content, ledger
//! and local report collection together from a [`ClientConfig`].
//!
//! ## On-disk State
//!
//! ```text
//! {data_dir}/
//! ├── session/session.json
//! └── reports/reports.redb
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::auth::{
    signer_from_source, AuthError, HttpIdentityClient, IdentityApi, PasswordAuth, Signer,
    SignerError, WalletAuthCoordinator,
};
use crate::config::ClientConfig;
use crate::content::{ContentStore, FsMediaSource, HttpContentStore, MediaSource};
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::ledger::{HttpLedgerClient, LedgerApi, RewardClaim};
use crate::models::{Report, ReportDraft};
use crate::reconciler::LocalReportReconciler;
use crate::session::{Session, SessionError, SessionStore};
use crate::storage::{LocalStorage, ReportDatabase, StorageError, StoragePaths};
use crate::submission::{ReportSubmissionCoordinator, SubmissionError, SubmissionStage};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("HTTP client error: {0}")]
    Http(#[from] ApiError),
}

pub struct MineGuardClient {
    session: SessionStore,
    identity: Arc<dyn IdentityApi>,
    signer: Option<Arc<dyn Signer>>,
    content: Arc<dyn ContentStore>,
    ledger: Arc<dyn LedgerApi>,
    media: Arc<dyn MediaSource>,
    reports: Arc<LocalReportReconciler>,
}

impl MineGuardClient {
    /// Open local state under `config.data_dir` and connect to the backend.
    pub fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let paths = StoragePaths::new(&config.data_dir);
        let mut storage = LocalStorage::new(paths.clone());
        storage.initialize()?;

        let session = SessionStore::open(storage)?;
        let reports = match ReportDatabase::open(&paths.reports_db()) {
            Ok(db) => LocalReportReconciler::open(Arc::new(db)),
            Err(e) => {
                warn!(error = %e, "Report database unavailable; keeping reports in memory only");
                LocalReportReconciler::in_memory()
            }
        };

        let api = ApiClient::new(config, session.clone())?;
        let signer = signer_from_source(&config.signer, config.http_timeout)?;

        info!(
            api_url = %api.base_url(),
            data_dir = %config.data_dir.display(),
            signer = ?config.signer,
            "MineGuard client ready"
        );

        Ok(Self {
            session,
            identity: Arc::new(HttpIdentityClient::new(api.clone())),
            signer,
            content: Arc::new(HttpContentStore::new(api.clone())),
            ledger: Arc::new(HttpLedgerClient::new(api, config.ledger_timeout)),
            media: Arc::new(FsMediaSource),
            reports: Arc::new(reports),
        })
    }

    /// Use a caller-provided signer, e.g. an injected browser wallet.
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Replace the identity service client.
    pub fn with_identity(mut self, identity: Arc<dyn IdentityApi>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_media_source(mut self, media: Arc<dyn MediaSource>) -> Self {
        self.media = media;
        self
    }

    pub async fn session(&self) -> Session {
        self.session.get().await
    }

    // ========== Authentication ==========

    fn password_auth(&self) -> PasswordAuth {
        PasswordAuth::new(self.identity.clone(), self.session.clone())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.password_auth().login(email, password).await
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        wallet_address: &str,
        share_profile: bool,
    ) -> Result<Session, AuthError> {
        self.password_auth()
            .signup(email, password, wallet_address, share_profile)
            .await
    }

    pub async fn authenticate_with_wallet(&self) -> Result<Session, AuthError> {
        WalletAuthCoordinator::new(
            self.identity.clone(),
            self.signer.clone(),
            self.session.clone(),
        )
        .authenticate()
        .await
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.session.clear().await?;
        info!("Logged out");
        Ok(())
    }

    // ========== Reports ==========

    fn submissions(&self) -> ReportSubmissionCoordinator {
        ReportSubmissionCoordinator::new(
            self.content.clone(),
            self.ledger.clone(),
            self.media.clone(),
            self.session.clone(),
            self.reports.clone(),
        )
    }

    pub async fn submit_report(&self, draft: ReportDraft) -> Result<Report, SubmissionError> {
        self.submissions().submit(draft).await
    }

    pub async fn submit_tracked(
        &self,
        draft: ReportDraft,
        cancel: &CancellationToken,
        progress: &watch::Sender<SubmissionStage>,
    ) -> Result<Report, SubmissionError> {
        self.submissions()
            .submit_tracked(draft, cancel, progress)
            .await
    }

    /// Local reports, newest first.
    pub fn reports(&self) -> Vec<Report> {
        self.reports.all()
    }

    /// Pull server-side status and rewards into the local collection.
    ///
    /// Returns the number of local reports that changed.
    pub async fn refresh_reports(&self) -> Result<usize, ApiError> {
        let server_reports = self.ledger.my_reports().await?;
        let changed = self.reports.apply_server_state(&server_reports);
        info!(fetched = server_reports.len(), changed, "Reports refreshed");
        Ok(changed)
    }

    pub async fn claim_reward(&self, report_id: &str) -> Result<RewardClaim, ApiError> {
        let claim = self.ledger.claim_reward(report_id).await?;
        info!(report_id = %claim.id, reward = claim.reward_amount, "Reward claimed");
        Ok(claim)
    }
}
