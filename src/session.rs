// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Store
//!
//! Holds the current identity and persists it across restarts.
//!
//! A [`Session`] is either fully empty or carries a bearer credential.
//! Every mutation persists before it becomes visible, and the write lock
//! is held across persistence, so readers always observe the most
//! recently completed write.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::claims::CredentialClaims;
use crate::auth::roles::Role;
use crate::models::WalletAddress;
use crate::storage::{LocalStorage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Fields were set without a bearer credential.
    #[error("session has identity fields but no bearer credential")]
    Incomplete,

    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Current identity.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<WalletAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_credential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// Bearer credential must never reach logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("wallet_address", &self.wallet_address)
            .field(
                "bearer_credential",
                &self.bearer_credential.as_ref().map(|_| "<redacted>"),
            )
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

impl Session {
    /// A session holding only a credential.
    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            bearer_credential: Some(credential.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Session::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_credential.is_some()
    }

    /// Empty, or carrying a credential.
    pub fn is_well_formed(&self) -> bool {
        self.is_empty() || self.is_authenticated()
    }

    fn claims(&self) -> Option<CredentialClaims> {
        CredentialClaims::peek(self.bearer_credential.as_deref()?).ok()
    }

    /// Expiry read from the credential itself, if it is a readable token.
    pub fn credential_expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims()?.expires_at()
    }

    /// `false` for opaque credentials; only the server can judge those.
    pub fn credential_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.claims().is_some_and(|claims| claims.is_expired_at(now))
    }
}

/// Shared, persisted holder of the current [`Session`].
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
    storage: Option<Arc<LocalStorage>>,
}

impl SessionStore {
    /// Store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Session::default())),
            storage: None,
        }
    }

    /// Open a persisted store, loading any previously saved session.
    ///
    /// A saved record that cannot be decoded, or is malformed (identity
    /// without credential), is discarded.
    pub fn open(storage: LocalStorage) -> Result<Self, SessionError> {
        let path = storage.paths().session_file();
        let loaded: Session = match storage.read_json_opt(&path) {
            Ok(loaded) => loaded.unwrap_or_default(),
            Err(StorageError::Json(e)) => {
                warn!(error = %e, "Discarding undecodable persisted session");
                storage.delete(&path)?;
                Session::default()
            }
            Err(e) => return Err(e.into()),
        };

        let session = if loaded.is_well_formed() {
            loaded
        } else {
            warn!("Discarding persisted session without a bearer credential");
            storage.delete(&path)?;
            Session::default()
        };

        let expires_at = session.credential_expires_at();
        if session.credential_expired_at(Utc::now()) {
            warn!(expires_at = ?expires_at, "Persisted credential has expired; sign in again");
        }
        debug!(
            authenticated = session.is_authenticated(),
            expires_at = ?expires_at,
            "Session store opened"
        );

        Ok(Self {
            inner: Arc::new(RwLock::new(session)),
            storage: Some(Arc::new(storage)),
        })
    }

    /// Snapshot of the current session.
    pub async fn get(&self) -> Session {
        self.inner.read().await.clone()
    }

    /// Current bearer credential, read at call time.
    pub async fn bearer(&self) -> Option<String> {
        self.inner.read().await.bearer_credential.clone()
    }

    /// Replace the session. Persisted before it becomes visible; on a
    /// storage failure the previous session stays in place.
    pub async fn set(&self, session: Session) -> Result<(), SessionError> {
        if !session.is_well_formed() {
            return Err(SessionError::Incomplete);
        }
        let mut guard = self.inner.write().await;
        self.persist(&session)?;
        *guard = session;
        info!(
            wallet = ?guard.wallet_address,
            role = ?guard.role,
            "Session established"
        );
        Ok(())
    }

    /// Mutate individual fields. The result must still be well formed.
    pub async fn update<F>(&self, mutate: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Session),
    {
        let mut guard = self.inner.write().await;
        let mut next = guard.clone();
        mutate(&mut next);
        if !next.is_well_formed() {
            return Err(SessionError::Incomplete);
        }
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    /// Clear every field and remove the persisted record.
    pub async fn clear(&self) -> Result<(), SessionError> {
        let mut guard = self.inner.write().await;
        if let Some(storage) = &self.storage {
            storage.delete(storage.paths().session_file())?;
        }
        *guard = Session::default();
        info!("Session cleared");
        Ok(())
    }

    fn persist(&self, session: &Session) -> Result<(), SessionError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let path = storage.paths().session_file();
        if session.is_empty() {
            storage.delete(&path)?;
        } else {
            storage.write_json(&path, session)?;
        }
        Ok(())
    }
}
