// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use crate::session::SessionError;
use crate::validation::ValidationError;

/// Failure of a login, sign-up or wallet authentication attempt.
///
/// Wallet variants follow the handshake order: signer, challenge,
/// signature, verify. None of them is retried automatically; a retry
/// always starts over with a fresh challenge.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No signing capability is configured.
    #[error("no wallet signer is configured")]
    NoSigner,

    /// Nonce request failed (network or 5xx).
    #[error("could not obtain a login challenge: {0}")]
    ChallengeUnavailable(String),

    /// The wallet holder declined to sign.
    #[error("signature request was rejected by the wallet")]
    UserRejectedSignature,

    /// The signer failed for a reason other than user refusal.
    #[error("wallet signer failed: {0}")]
    SignerFailed(String),

    /// Verify endpoint rejected the signature or nonce (4xx).
    #[error("wallet signature was not accepted: {0}")]
    InvalidSignature(String),

    /// Verify endpoint unreachable or failing (5xx/network).
    #[error("wallet verification is unavailable: {0}")]
    VerifyUnavailable(String),

    /// Email/password pair refused.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Sign-up refused (e.g. email or wallet already registered).
    #[error("registration rejected: {0}")]
    RegistrationRejected(String),

    /// Identity service unreachable or failing.
    #[error("identity service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Identity service answered with something unusable.
    #[error("unexpected identity service response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Authentication succeeded but the session could not be stored.
    #[error("could not persist session: {0}")]
    Session(#[from] SessionError),
}

impl AuthError {
    /// Whether running the attempt again (with backoff) may succeed
    /// without new user input.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthError::ChallengeUnavailable(_)
                | AuthError::VerifyUnavailable(_)
                | AuthError::ServiceUnavailable(_)
        )
    }
}
