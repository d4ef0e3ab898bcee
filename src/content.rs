// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content store client.
//!
//! Media bytes and metadata documents are pinned through the backend's
//! proxy endpoints and come back as content ids:
//!
//! - `POST /ipfs/upload` - multipart, field `file`
//! - `POST /ipfs/upload-json` - arbitrary JSON document
//!
//! Uploads are not deduplicated. Retrying with identical bytes yields the
//! same content id; anything else is a new object.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::models::ContentId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Credential missing or expired; re-authenticate before retrying.
    #[error("upload unauthorized: {0}")]
    Unauthorized(String),

    /// Size or type policy refused the payload.
    #[error("upload rejected ({status}): {detail}")]
    PayloadRejected { status: u16, detail: String },

    /// Network failure, timeout or 5xx. Safe to retry.
    #[error("content store unavailable: {0}")]
    Unavailable(String),

    #[error("upload failed: {0}")]
    Unknown(String),

    /// The local file could not be read.
    #[error("cannot read {uri}: {reason}")]
    Unreadable { uri: String, reason: String },
}

impl UploadError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadError::Unavailable(_))
    }
}

impl From<ApiError> for UploadError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { detail, .. } => UploadError::Unauthorized(detail),
            ApiError::Rejected { status, detail } => match status {
                400 | 413 | 415 | 422 => UploadError::PayloadRejected { status, detail },
                _ => UploadError::Unknown(format!("{status}: {detail}")),
            },
            ApiError::Server { .. }
            | ApiError::Timeout(_)
            | ApiError::Connect(_)
            | ApiError::Transport(_) => UploadError::Unavailable(err.to_string()),
            ApiError::InvalidResponse(msg) | ApiError::InvalidRequest(msg) => {
                UploadError::Unknown(msg)
            }
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(alias = "contentId", alias = "cid")]
    ipfs_hash: String,
}

impl UploadResponse {
    fn into_content_id(self) -> Result<ContentId, UploadError> {
        let hash = self.ipfs_hash.trim();
        if hash.is_empty() {
            return Err(UploadError::Unknown("empty content id".to_string()));
        }
        Ok(ContentId(hash.to_string()))
    }
}

/// Content-addressed store as seen by the submission pipeline.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<ContentId, UploadError>;

    async fn upload_metadata(&self, document: &serde_json::Value)
        -> Result<ContentId, UploadError>;
}

/// [`ContentStore`] backed by the service's IPFS proxy.
#[derive(Clone)]
pub struct HttpContentStore {
    api: ApiClient,
}

impl HttpContentStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<ContentId, UploadError> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| UploadError::Unknown(format!("invalid MIME type {mime_type}: {e}")))?;
        let form = Form::new().part("file", part);

        let response: UploadResponse = self.api.post_multipart("/ipfs/upload", form).await?;
        let content_id = response.into_content_id()?;
        debug!(file_name, size, content_id = %content_id, "Media pinned");
        Ok(content_id)
    }

    async fn upload_metadata(
        &self,
        document: &serde_json::Value,
    ) -> Result<ContentId, UploadError> {
        let response: UploadResponse = self
            .api
            .post_json("/ipfs/upload-json", document, None)
            .await?;
        let content_id = response.into_content_id()?;
        debug!(content_id = %content_id, "Metadata pinned");
        Ok(content_id)
    }
}

// =============================================================================
// Media Source
// =============================================================================

/// Resolves a [`MediaFile`](crate::models::MediaFile) uri to its bytes.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn load(&self, uri: &str) -> Result<Vec<u8>, UploadError>;
}

/// Reads `file://` URIs and plain paths from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsMediaSource;

fn local_path(uri: &str) -> Result<PathBuf, UploadError> {
    if uri.starts_with("file:") {
        let unreadable = |reason: &str| UploadError::Unreadable {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };
        let url = Url::parse(uri).map_err(|e| unreadable(&e.to_string()))?;
        url.to_file_path()
            .map_err(|()| unreadable("not a local file URI"))
    } else {
        Ok(Path::new(uri).to_path_buf())
    }
}

#[async_trait]
impl MediaSource for FsMediaSource {
    async fn load(&self, uri: &str) -> Result<Vec<u8>, UploadError> {
        let path = local_path(uri)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| UploadError::Unreadable {
                uri: uri.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::{Session, SessionStore};
    use mockito::Matcher;
    use serde_json::json;

    async fn store(url: &str) -> HttpContentStore {
        let config = ClientConfig {
            api_url: url.to_string(),
            ..ClientConfig::default()
        };
        let session = SessionStore::in_memory();
        session.set(Session::with_credential("tok")).await.unwrap();
        HttpContentStore::new(ApiClient::new(&config, session).unwrap())
    }

    #[tokio::test]
    async fn media_upload_sends_multipart_file_field() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ipfs/upload")
            .match_header("authorization", "Bearer tok")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex(
                r#"name="file"; filename="photo.jpg""#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"ipfs_hash":"QmPhoto"}"#)
            .create_async()
            .await;

        let store = store(&server.url()).await;
        let cid = store
            .upload_media(b"jpeg bytes".to_vec(), "photo.jpg", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(cid, ContentId::from("QmPhoto"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn metadata_upload_posts_document() {
        let mut server = mockito::Server::new_async().await;
        let document = json!({"description": "pit", "mediaFiles": []});
        let _m1 = server
            .mock("POST", "/ipfs/upload-json")
            .match_body(Matcher::Json(document.clone()))
            .with_status(200)
            .with_body(r#"{"contentId":"QmMeta"}"#)
            .create_async()
            .await;

        let store = store(&server.url()).await;
        assert_eq!(
            store.upload_metadata(&document).await.unwrap(),
            ContentId::from("QmMeta")
        );
    }

    #[tokio::test]
    async fn failures_are_classified() {
        let mut server = mockito::Server::new_async().await;
        let _m2 = server
            .mock("POST", "/ipfs/upload-json")
            .with_status(401)
            .with_body(r#"{"detail":"Token expired"}"#)
            .create_async()
            .await;
        let _m3 = server
            .mock("POST", "/ipfs/upload")
            .with_status(413)
            .with_body(r#"{"detail":"File too large"}"#)
            .create_async()
            .await;

        let store = store(&server.url()).await;
        let err = store.upload_metadata(&json!({})).await.unwrap_err();
        assert_eq!(err, UploadError::Unauthorized("Token expired".to_string()));
        assert!(!err.is_retryable());

        let err = store
            .upload_media(vec![0; 4], "clip.mp4", "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::PayloadRejected { status: 413, .. }));
    }

    #[tokio::test]
    async fn server_error_is_retryable_and_empty_hash_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        let _m4 = server
            .mock("POST", "/ipfs/upload")
            .with_status(500)
            .with_body(r#"{"detail":"Failed to upload file to IPFS"}"#)
            .create_async()
            .await;
        let _m5 = server
            .mock("POST", "/ipfs/upload-json")
            .with_status(200)
            .with_body(r#"{"ipfs_hash":"  "}"#)
            .create_async()
            .await;

        let store = store(&server.url()).await;
        let err = store
            .upload_media(vec![1], "photo.png", "image/png")
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let err = store.upload_metadata(&json!({})).await.unwrap_err();
        assert!(matches!(err, UploadError::Unknown(_)));
    }

    #[test]
    fn status_mapping() {
        let rejected = |status| ApiError::Rejected {
            status,
            detail: String::new(),
        };
        assert!(matches!(
            UploadError::from(rejected(415)),
            UploadError::PayloadRejected { status: 415, .. }
        ));
        assert!(matches!(UploadError::from(rejected(404)), UploadError::Unknown(_)));
        assert!(UploadError::from(ApiError::Timeout("slow".into())).is_retryable());
        assert!(UploadError::from(ApiError::Connect("refused".into())).is_retryable());
    }

    #[tokio::test]
    async fn fs_source_reads_paths_and_file_uris() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"pixels").unwrap();

        let source = FsMediaSource;
        assert_eq!(source.load(path.to_str().unwrap()).await.unwrap(), b"pixels");

        let uri = Url::from_file_path(&path).unwrap().to_string();
        assert_eq!(source.load(&uri).await.unwrap(), b"pixels");

        let missing = dir.path().join("gone.jpg");
        let err = source.load(missing.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, UploadError::Unreadable { .. }));
    }
}
