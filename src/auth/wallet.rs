// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet and password authentication flows.
//!
//! ## Wallet Flow
//!
//! 1. Ask the [`Signer`] for its address
//! 2. Request a nonce for that address
//! 3. Have the signer sign the literal nonce
//! 4. Submit `(address, signature, nonce)` for verification
//! 5. Store the resulting session
//!
//! Nothing is retried. Every call to [`WalletAuthCoordinator::authenticate`]
//! fetches a fresh nonce, and the session store is only written in step 5.

use std::sync::Arc;

use tracing::{info, warn};

use super::error::AuthError;
use super::identity::{
    IdentityApi, IdentityError, LoginRequest, SignupRequest, VerifyWalletRequest,
};
use super::signer::{Signer, SignerError};
use crate::session::{Session, SessionStore};
use crate::validation::{validate_credentials, validate_wallet_address, Field, ValidationError};

fn signer_error(err: SignerError) -> AuthError {
    match err {
        SignerError::NotConfigured(_) => AuthError::NoSigner,
        SignerError::Rejected(_) => AuthError::UserRejectedSignature,
        SignerError::InvalidKey(msg) | SignerError::Failed(msg) => AuthError::SignerFailed(msg),
    }
}

/// Orchestrates the nonce/sign/verify exchange.
pub struct WalletAuthCoordinator {
    identity: Arc<dyn IdentityApi>,
    signer: Option<Arc<dyn Signer>>,
    session: SessionStore,
}

impl WalletAuthCoordinator {
    pub fn new(
        identity: Arc<dyn IdentityApi>,
        signer: Option<Arc<dyn Signer>>,
        session: SessionStore,
    ) -> Self {
        Self {
            identity,
            signer,
            session,
        }
    }

    pub async fn authenticate(&self) -> Result<Session, AuthError> {
        let signer = self.signer.as_ref().ok_or(AuthError::NoSigner)?;

        let wallet = signer.address().await.map_err(signer_error)?;

        let nonce = self
            .identity
            .request_nonce(&wallet)
            .await
            .map_err(|e| AuthError::ChallengeUnavailable(e.to_string()))?;

        let signature = signer.sign_message(&nonce).await.map_err(|e| {
            warn!(wallet = %wallet, error = %e, "Wallet did not sign the challenge");
            signer_error(e)
        })?;

        let request = VerifyWalletRequest {
            wallet_address: wallet.clone(),
            signature,
            nonce,
        };
        let response = self
            .identity
            .verify_wallet(&request)
            .await
            .map_err(|e| match e {
                IdentityError::Rejected { detail, .. } => AuthError::InvalidSignature(detail),
                IdentityError::Unavailable(msg) => AuthError::VerifyUnavailable(msg),
                IdentityError::InvalidResponse(msg) => AuthError::InvalidResponse(msg),
            })?;

        let session = response.into_session(Some(&wallet));
        self.session.set(session.clone()).await?;
        info!(wallet = %wallet, "Wallet authentication succeeded");
        Ok(session)
    }
}

/// Email/password login and registration.
pub struct PasswordAuth {
    identity: Arc<dyn IdentityApi>,
    session: SessionStore,
}

impl PasswordAuth {
    pub fn new(identity: Arc<dyn IdentityApi>, session: SessionStore) -> Self {
        Self { identity, session }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if !email.contains('@') {
            return Err(ValidationError::new(Field::Email, "not an email address").into());
        }
        if password.is_empty() {
            return Err(ValidationError::new(Field::Password, "password is required").into());
        }

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.identity.login(&request).await.map_err(|e| match e {
            IdentityError::Rejected { detail, .. } => AuthError::InvalidCredentials(detail),
            IdentityError::Unavailable(msg) => AuthError::ServiceUnavailable(msg),
            IdentityError::InvalidResponse(msg) => AuthError::InvalidResponse(msg),
        })?;

        let session = response.into_session(None);
        self.session.set(session.clone()).await?;
        info!(user_id = ?session.user_id, "Password login succeeded");
        Ok(session)
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        wallet_address: &str,
        share_profile: bool,
    ) -> Result<Session, AuthError> {
        validate_credentials(email, password)?;
        let wallet = validate_wallet_address(wallet_address)?;

        let request = SignupRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            wallet_address: wallet.clone(),
            share_profile,
        };
        let response = self.identity.signup(&request).await.map_err(|e| match e {
            IdentityError::Rejected { detail, .. } => AuthError::RegistrationRejected(detail),
            IdentityError::Unavailable(msg) => AuthError::ServiceUnavailable(msg),
            IdentityError::InvalidResponse(msg) => AuthError::InvalidResponse(msg),
        })?;

        let session = response.into_session(Some(&wallet));
        self.session.set(session.clone()).await?;
        info!(user_id = ?session.user_id, "Account registered");
        Ok(session)
    }
}
