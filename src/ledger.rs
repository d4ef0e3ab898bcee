// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger submission client.
//!
//! ## Endpoints
//!
//! - `POST /reports/submit-onchain` - anchor a report (not idempotent)
//! - `GET /reports/my-reports` - server view of the caller's reports
//! - `POST /reports/{id}/claim-reward` - claim the reward of an approved report
//!
//! [`LedgerApi::submit`] may create a duplicate on-chain entry if it is
//! repeated, so this client never retries it. A timeout, an unreadable
//! success body or a 5xx other than 503 is reported as
//! [`SubmitError::Ambiguous`]: the service sends the chain transaction
//! before it records the report, so the entry may exist.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::models::{Category, ContentId, Location, MediaKind, MediaRef, ReportStatus, Severity};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("ledger submission unauthorized: {0}")]
    Unauthorized(String),

    /// The service refused the submission; nothing was anchored.
    #[error("ledger submission rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// Connection refused, or 503 from the pre-flight chain check.
    /// Nothing was sent to the chain.
    #[error("ledger service unavailable: {0}")]
    Unavailable(String),

    /// Outcome unknown. Query report status before resubmitting.
    #[error("ledger submission outcome unknown: {0}")]
    Ambiguous(String),
}

impl SubmitError {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, SubmitError::Ambiguous(_))
    }
}

impl From<ApiError> for SubmitError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { detail, .. } => SubmitError::Unauthorized(detail),
            ApiError::Rejected { status, detail } => SubmitError::Rejected { status, detail },
            ApiError::Server { status: 503, .. }
            | ApiError::Connect(_)
            | ApiError::InvalidRequest(_) => SubmitError::Unavailable(err.to_string()),
            ApiError::Server { .. }
            | ApiError::Timeout(_)
            | ApiError::Transport(_)
            | ApiError::InvalidResponse(_) => SubmitError::Ambiguous(err.to_string()),
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerMediaRef {
    #[serde(rename = "ipfsHash")]
    pub content_id: ContentId,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

impl From<&MediaRef> for LedgerMediaRef {
    fn from(media: &MediaRef) -> Self {
        Self {
            content_id: media.content_id.clone(),
            kind: media.kind,
            file_name: media.file_name.clone(),
        }
    }
}

/// Body of `POST /reports/submit-onchain`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSubmission {
    #[serde(rename = "ipfs_hash")]
    pub metadata_content_id: ContentId,
    pub severity: Severity,
    pub category: Category,
    pub description: String,
    pub location: Location,
    #[serde(rename = "mediaFiles")]
    pub media_refs: Vec<LedgerMediaRef>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    tx_hash: String,
    #[serde(default)]
    contract_report_id: Option<u64>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// What the ledger service returned for an anchored report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    pub transaction_ref: String,
    /// Service-assigned report id, when present.
    pub report_id: Option<String>,
    pub contract_report_id: Option<u64>,
    pub status: Option<ReportStatus>,
}

/// A report as the service currently sees it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerReport {
    pub id: String,
    #[serde(default)]
    pub ipfs_hash: Option<String>,
    pub status: String,
    #[serde(default)]
    pub reward_amount: Option<f64>,
    #[serde(default)]
    pub reward_claimed: bool,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

impl ServerReport {
    pub fn status(&self) -> Option<ReportStatus> {
        ReportStatus::from_server(&self.status)
    }
}

#[derive(Deserialize)]
struct ReportList {
    #[serde(default)]
    total: usize,
    reports: Vec<ServerReport>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardClaim {
    pub id: String,
    pub reward_amount: f64,
    /// Server timestamp, passed through as received.
    pub claimed_at: String,
}

// =============================================================================
// Contract
// =============================================================================

#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Anchor a report. Callers must issue this at most once per submission.
    async fn submit(&self, submission: &LedgerSubmission) -> Result<LedgerReceipt, SubmitError>;

    async fn my_reports(&self) -> Result<Vec<ServerReport>, ApiError>;

    async fn claim_reward(&self, report_id: &str) -> Result<RewardClaim, ApiError>;
}

/// [`LedgerApi`] over the backend's report endpoints.
#[derive(Clone)]
pub struct HttpLedgerClient {
    api: ApiClient,
    submit_timeout: Duration,
}

impl HttpLedgerClient {
    pub fn new(api: ApiClient, submit_timeout: Duration) -> Self {
        Self {
            api,
            submit_timeout,
        }
    }
}

#[async_trait]
impl LedgerApi for HttpLedgerClient {
    async fn submit(&self, submission: &LedgerSubmission) -> Result<LedgerReceipt, SubmitError> {
        let response: SubmitResponse = self
            .api
            .post_json(
                "/reports/submit-onchain",
                submission,
                Some(self.submit_timeout),
            )
            .await?;

        if response.tx_hash.trim().is_empty() {
            return Err(SubmitError::Ambiguous(
                "response carried no transaction reference".to_string(),
            ));
        }
        Ok(LedgerReceipt {
            transaction_ref: response.tx_hash,
            report_id: response.id.filter(|id| !id.trim().is_empty()),
            contract_report_id: response.contract_report_id,
            status: response.status.as_deref().and_then(ReportStatus::from_server),
        })
    }

    async fn my_reports(&self) -> Result<Vec<ServerReport>, ApiError> {
        let list: ReportList = self.api.get_json("/reports/my-reports").await?;
        tracing::debug!(total = list.total, returned = list.reports.len(), "Fetched server reports");
        Ok(list.reports)
    }

    async fn claim_reward(&self, report_id: &str) -> Result<RewardClaim, ApiError> {
        self.api
            .post_empty(&format!("/reports/{report_id}/claim-reward"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionStore;
    use mockito::Matcher;
    use serde_json::json;

    fn client(url: &str, submit_timeout: Duration) -> HttpLedgerClient {
        let config = ClientConfig {
            api_url: url.to_string(),
            ..ClientConfig::default()
        };
        let api = ApiClient::new(&config, SessionStore::in_memory()).unwrap();
        HttpLedgerClient::new(api, submit_timeout)
    }

    fn submission() -> LedgerSubmission {
        LedgerSubmission {
            metadata_content_id: ContentId::from("QmMeta"),
            severity: Severity::High,
            category: Category::IllegalMining,
            description: "Excavation beyond lease boundary near river, 20m deep pit".to_string(),
            location: Location::new(23.79, 86.43),
            media_refs: vec![LedgerMediaRef {
                content_id: ContentId::from("QmPhoto"),
                kind: MediaKind::Image,
                file_name: "photo.jpg".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn submit_uses_backend_wire_format() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/reports/submit-onchain")
            .match_body(Matcher::Json(json!({
                "ipfs_hash": "QmMeta",
                "severity": "high",
                "category": "illegal_mining",
                "description": "Excavation beyond lease boundary near river, 20m deep pit",
                "location": {"latitude": 23.79, "longitude": 86.43},
                "mediaFiles": [{"ipfsHash": "QmPhoto", "type": "image", "fileName": "photo.jpg"}]
            })))
            .with_status(200)
            .with_body(r#"{"tx_hash":"0xabc","contract_report_id":7,"id":"r-1","status":"pending"}"#)
            .expect(1)
            .create_async()
            .await;

        let receipt = client(&server.url(), Duration::from_secs(5))
            .submit(&submission())
            .await
            .unwrap();
        assert_eq!(
            receipt,
            LedgerReceipt {
                transaction_ref: "0xabc".to_string(),
                report_id: Some("r-1".to_string()),
                contract_report_id: Some(7),
                status: Some(ReportStatus::Pending),
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejection_and_outage_are_definite() {
        let mut server = mockito::Server::new_async().await;
        let _m1 = server
            .mock("POST", "/reports/submit-onchain")
            .with_status(400)
            .with_body(r#"{"detail":"ipfs_hash required"}"#)
            .create_async()
            .await;
        let err = client(&server.url(), Duration::from_secs(5))
            .submit(&submission())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SubmitError::Rejected {
                status: 400,
                detail: "ipfs_hash required".to_string()
            }
        );

        let mut server = mockito::Server::new_async().await;
        let _m2 = server
            .mock("POST", "/reports/submit-onchain")
            .with_status(503)
            .with_body(r#"{"detail":"Blockchain RPC unavailable"}"#)
            .create_async()
            .await;
        let err = client(&server.url(), Duration::from_secs(5))
            .submit(&submission())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Unavailable(_)));
        assert!(!err.is_ambiguous());
    }

    #[tokio::test]
    async fn internal_error_after_send_is_ambiguous() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/reports/submit-onchain")
            .with_status(500)
            .with_body(r#"{"detail":"Failed to submit report on-chain"}"#)
            .expect(1)
            .create_async()
            .await;
        let err = client(&server.url(), Duration::from_secs(5))
            .submit(&submission())
            .await
            .unwrap_err();
        assert!(err.is_ambiguous(), "got {err:?}");
        assert!(err.to_string().contains("Failed to submit report on-chain"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreadable_success_is_ambiguous() {
        let mut server = mockito::Server::new_async().await;
        let _m3 = server
            .mock("POST", "/reports/submit-onchain")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;
        let err = client(&server.url(), Duration::from_secs(5))
            .submit(&submission())
            .await
            .unwrap_err();
        assert!(err.is_ambiguous());
    }

    #[tokio::test]
    async fn slow_submission_times_out_as_ambiguous() {
        let mut server = mockito::Server::new_async().await;
        let _m4 = server
            .mock("POST", "/reports/submit-onchain")
            .with_status(200)
            .with_chunked_body(|w| {
                use std::io::Write;
                std::thread::sleep(std::time::Duration::from_millis(500));
                w.write_all(br#"{"tx_hash":"0xlate"}"#)
            })
            .create_async()
            .await;
        let err = client(&server.url(), Duration::from_millis(100))
            .submit(&submission())
            .await
            .unwrap_err();
        assert!(err.is_ambiguous(), "got {err:?}");
    }

    #[test]
    fn transport_classification() {
        assert!(SubmitError::from(ApiError::Timeout("t".into())).is_ambiguous());
        assert!(SubmitError::from(ApiError::Transport("reset".into())).is_ambiguous());
        assert!(!SubmitError::from(ApiError::Connect("refused".into())).is_ambiguous());
        let server = |status| ApiError::Server {
            status,
            detail: String::new(),
        };
        assert!(matches!(SubmitError::from(server(503)), SubmitError::Unavailable(_)));
        assert!(SubmitError::from(server(502)).is_ambiguous());
        assert!(SubmitError::from(server(504)).is_ambiguous());
        assert!(matches!(
            SubmitError::from(ApiError::Unauthorized {
                status: 401,
                detail: "expired".into()
            }),
            SubmitError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn my_reports_and_claim_reward() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/reports/my-reports")
            .with_status(200)
            .with_body(
                json!({
                    "total": 1,
                    "reports": [{
                        "id": "r-1",
                        "ipfs_hash": "QmMeta",
                        "category": "illegal_mining",
                        "description": "ignored",
                        "severity": "high",
                        "status": "approved",
                        "latitude": 23.79,
                        "longitude": 86.43,
                        "reward_amount": 0.5,
                        "reward_claimed": false,
                        "created_at": "2026-01-01T00:00:00"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _m6 = server
            .mock("POST", "/reports/r-1/claim-reward")
            .with_status(200)
            .with_body(r#"{"id":"r-1","rewardAmount":0.5,"claimedAt":"2026-01-02T10:00:00"}"#)
            .create_async()
            .await;

        let ledger = client(&server.url(), Duration::from_secs(5));
        let reports = ledger.my_reports().await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status(), Some(ReportStatus::Approved));
        assert_eq!(reports[0].reward_amount, Some(0.5));

        let claim = ledger.claim_reward("r-1").await.unwrap();
        assert_eq!(claim.reward_amount, 0.5);
    }
}
