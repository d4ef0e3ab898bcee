// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-use login challenges, one outstanding per wallet.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::WalletAddress;

/// How long an issued nonce stays valid.
pub const CHALLENGE_TTL_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("no challenge outstanding for this wallet")]
    NotIssued,

    #[error("nonce does not match the outstanding challenge")]
    Mismatch,

    #[error("challenge expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub wallet_address: WalletAddress,
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues nonces and accepts each one at most once.
///
/// Issuing a new challenge for a wallet replaces the previous one.
pub struct ChallengeStore {
    ttl: Duration,
    outstanding: Mutex<HashMap<WalletAddress, Challenge>>,
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new(Duration::seconds(CHALLENGE_TTL_SECS))
    }
}

impl ChallengeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            outstanding: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, wallet: &WalletAddress) -> Challenge {
        self.issue_at(wallet, Utc::now())
    }

    pub fn issue_at(&self, wallet: &WalletAddress, now: DateTime<Utc>) -> Challenge {
        let challenge = Challenge {
            wallet_address: wallet.clone(),
            // 128 random bits, hex encoded
            nonce: Uuid::new_v4().simple().to_string(),
            expires_at: now + self.ttl,
        };
        let mut outstanding = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        outstanding.retain(|_, c| c.expires_at > now);
        outstanding.insert(wallet.clone(), challenge.clone());
        challenge
    }

    pub fn consume(&self, wallet: &WalletAddress, nonce: &str) -> Result<(), ChallengeError> {
        self.consume_at(wallet, nonce, Utc::now())
    }

    /// Accept `nonce` if it is the live challenge for `wallet`.
    ///
    /// A matching nonce is removed whatever happens next, so it can never
    /// be presented twice. A mismatch leaves the outstanding one in place.
    pub fn consume_at(
        &self,
        wallet: &WalletAddress,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ChallengeError> {
        let mut outstanding = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        let challenge = outstanding.get(wallet).ok_or(ChallengeError::NotIssued)?;

        if challenge.expires_at <= now {
            outstanding.remove(wallet);
            return Err(ChallengeError::Expired);
        }
        if challenge.nonce != nonce {
            return Err(ChallengeError::Mismatch);
        }
        outstanding.remove(wallet);
        Ok(())
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
