// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process identity service.
//!
//! Implements [`IdentityApi`] without a backend, for offline development
//! and as a faithful collaborator in tests:
//!
//! - Accounts keyed by email, passwords stored as salted HMAC-SHA256
//! - Wallet challenges from a [`ChallengeStore`] (single use, 5 minute TTL)
//! - EIP-191 signature recovery before a wallet credential is issued
//! - HS256 bearer credentials

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::Sha256;
use tracing::{debug, info};
use uuid::Uuid;

use super::challenge::ChallengeStore;
use super::claims::CredentialClaims;
use super::identity::{
    AuthResponse, IdentityApi, IdentityError, LoginRequest, SignupRequest, UserProfile,
    VerifyWalletRequest,
};
use super::roles::Role;
use super::signer::recover_signer;
use crate::models::WalletAddress;
use crate::validation::validate_credentials;

type HmacSha256 = Hmac<Sha256>;

/// Default credential lifetime.
pub const DEFAULT_CREDENTIAL_TTL_MINUTES: i64 = 60 * 24;

#[derive(Debug, Clone)]
struct Account {
    id: String,
    email: String,
    salt: [u8; 16],
    password_mac: Vec<u8>,
    wallet_address: Option<WalletAddress>,
    role: Role,
    share_profile: bool,
}

impl Account {
    fn profile(&self, reveal_email: bool) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: reveal_email.then(|| self.email.clone()),
            wallet_address: self.wallet_address.as_ref().map(|w| w.to_string()),
            role: Some(self.role.to_string()),
            share_profile: Some(self.share_profile),
        }
    }
}

#[derive(Default)]
struct Directory {
    /// Lowercased email → account
    by_email: HashMap<String, Account>,
    /// Wallet → lowercased email
    by_wallet: HashMap<WalletAddress, String>,
}

pub struct LocalIdentityService {
    signing_secret: Vec<u8>,
    credential_ttl: Duration,
    challenges: ChallengeStore,
    directory: Mutex<Directory>,
}

fn password_mac(salt: &[u8], password: &str) -> Vec<u8> {
    let mut mac = match HmacSha256::new_from_slice(salt) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length
        Err(_) => return Vec::new(),
    };
    mac.update(password.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn password_matches(account: &Account, password: &str) -> bool {
    match HmacSha256::new_from_slice(&account.salt) {
        Ok(mut mac) => {
            mac.update(password.as_bytes());
            mac.verify_slice(&account.password_mac).is_ok()
        }
        Err(_) => false,
    }
}

fn rejected(status: u16, detail: impl Into<String>) -> IdentityError {
    IdentityError::Rejected {
        status,
        detail: detail.into(),
    }
}

impl LocalIdentityService {
    pub fn new(signing_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            credential_ttl: Duration::minutes(DEFAULT_CREDENTIAL_TTL_MINUTES),
            challenges: ChallengeStore::default(),
            directory: Mutex::new(Directory::default()),
        }
    }

    pub fn with_credential_ttl(mut self, ttl: Duration) -> Self {
        self.credential_ttl = ttl;
        self
    }

    pub fn with_challenge_store(mut self, challenges: ChallengeStore) -> Self {
        self.challenges = challenges;
        self
    }

    pub fn challenges(&self) -> &ChallengeStore {
        &self.challenges
    }

    /// Verify a credential previously issued by this service.
    pub fn verify_credential(&self, token: &str) -> Result<CredentialClaims, IdentityError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<CredentialClaims>(
            token,
            &DecodingKey::from_secret(&self.signing_secret),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| rejected(401, format!("Could not validate credentials: {e}")))
    }

    /// Change an account's role (e.g. promote a reviewer).
    pub fn set_role(&self, email: &str, role: Role) -> bool {
        let mut directory = self.directory.lock().unwrap_or_else(PoisonError::into_inner);
        match directory.by_email.get_mut(&email.trim().to_lowercase()) {
            Some(account) => {
                account.role = role;
                true
            }
            None => false,
        }
    }

    fn issue_credential(
        &self,
        account: &Account,
        include_email: bool,
    ) -> Result<String, IdentityError> {
        let now = Utc::now();
        let claims = CredentialClaims {
            sub: account.id.clone(),
            exp: (now + self.credential_ttl).timestamp(),
            iat: Some(now.timestamp()),
            email: include_email.then(|| account.email.clone()),
            wallet: account.wallet_address.as_ref().map(|w| w.to_string()),
            role: Some(account.role.to_string()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_secret),
        )
        .map_err(|e| IdentityError::Unavailable(format!("failed to issue credential: {e}")))
    }

    fn new_account(
        email: String,
        password: &str,
        wallet_address: Option<WalletAddress>,
        share_profile: bool,
    ) -> Account {
        let salt = *Uuid::new_v4().as_bytes();
        Account {
            id: Uuid::new_v4().to_string(),
            email,
            salt,
            password_mac: password_mac(&salt, password),
            wallet_address,
            role: Role::Citizen,
            share_profile,
        }
    }
}

#[async_trait]
impl IdentityApi for LocalIdentityService {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, IdentityError> {
        let key = request.email.trim().to_lowercase();
        let account = {
            let directory = self.directory.lock().unwrap_or_else(PoisonError::into_inner);
            directory.by_email.get(&key).cloned()
        };
        let account = match account {
            Some(account) if password_matches(&account, &request.password) => account,
            _ => return Err(rejected(401, "Invalid credentials")),
        };

        let token = self.issue_credential(&account, false)?;
        debug!(user_id = %account.id, "Password login accepted");
        Ok(AuthResponse {
            token,
            user: Some(account.profile(true)),
        })
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, IdentityError> {
        validate_credentials(&request.email, &request.password)
            .map_err(|e| rejected(422, e.to_string()))?;

        let key = request.email.trim().to_lowercase();
        let account = {
            let mut directory = self.directory.lock().unwrap_or_else(PoisonError::into_inner);
            if directory.by_wallet.contains_key(&request.wallet_address) {
                return Err(rejected(400, "Wallet already registered"));
            }
            if directory.by_email.contains_key(&key) {
                return Err(rejected(400, "Email already registered"));
            }
            let account = Self::new_account(
                request.email.trim().to_string(),
                &request.password,
                Some(request.wallet_address.clone()),
                request.share_profile,
            );
            directory
                .by_wallet
                .insert(request.wallet_address.clone(), key.clone());
            directory.by_email.insert(key, account.clone());
            account
        };

        let token = self.issue_credential(&account, true)?;
        info!(user_id = %account.id, "Account registered");
        Ok(AuthResponse {
            token,
            user: Some(account.profile(true)),
        })
    }

    async fn request_nonce(&self, wallet: &WalletAddress) -> Result<String, IdentityError> {
        Ok(self.challenges.issue(wallet).nonce)
    }

    async fn verify_wallet(
        &self,
        request: &VerifyWalletRequest,
    ) -> Result<AuthResponse, IdentityError> {
        self.challenges
            .consume(&request.wallet_address, &request.nonce)
            .map_err(|e| rejected(400, format!("Invalid or expired nonce: {e}")))?;

        let recovered = recover_signer(&request.nonce, &request.signature)
            .map_err(|e| rejected(400, format!("Signature verification failed: {e}")))?;
        if recovered != request.wallet_address {
            return Err(rejected(400, "Signature verification failed"));
        }

        let account = {
            let mut directory = self.directory.lock().unwrap_or_else(PoisonError::into_inner);
            let existing = directory
                .by_wallet
                .get(&request.wallet_address)
                .and_then(|email| directory.by_email.get(email))
                .cloned();
            match existing {
                Some(account) => account,
                None => {
                    let email = format!("{}@wallet.local", request.wallet_address);
                    let account = Self::new_account(
                        email.clone(),
                        &Uuid::new_v4().to_string(),
                        Some(request.wallet_address.clone()),
                        false,
                    );
                    directory
                        .by_wallet
                        .insert(request.wallet_address.clone(), email.clone());
                    directory.by_email.insert(email, account.clone());
                    info!(wallet = %request.wallet_address, "Wallet account created");
                    account
                }
            }
        };

        let token = self.issue_credential(&account, false)?;
        Ok(AuthResponse {
            token,
            user: Some(account.profile(account.share_profile)),
        })
    }
}
