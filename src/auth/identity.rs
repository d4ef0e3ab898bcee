// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity service contract and its HTTP client.
//!
//! ## Endpoints
//!
//! - `POST /auth/login` - email/password login
//! - `POST /auth/signup` - account registration
//! - `GET /auth/nonce/{wallet}` - issue a wallet challenge
//! - `POST /auth/verify-wallet` - exchange a signed challenge for a credential

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::claims::CredentialClaims;
use super::roles::Role;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::models::WalletAddress;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// 4xx: the service refused the request as given.
    #[error("identity request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// 5xx, timeout, or the service could not be reached.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    #[error("invalid identity response: {0}")]
    InvalidResponse(String),
}

impl From<ApiError> for IdentityError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { status, detail } | ApiError::Rejected { status, detail } => {
                IdentityError::Rejected { status, detail }
            }
            ApiError::InvalidResponse(msg) | ApiError::InvalidRequest(msg) => {
                IdentityError::InvalidResponse(msg)
            }
            other => IdentityError::Unavailable(other.to_string()),
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub wallet_address: WalletAddress,
    #[serde(default)]
    pub share_profile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyWalletRequest {
    pub wallet_address: WalletAddress,
    pub signature: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
}

/// Account summary returned alongside a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "wallet_address")]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "share_profile")]
    pub share_profile: Option<bool>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "bearerCredential", alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl AuthResponse {
    /// Build a session from the response.
    ///
    /// Fields missing from `user` are filled from the credential's claims,
    /// then from `wallet` (the address that was just verified).
    pub fn into_session(self, wallet: Option<&WalletAddress>) -> Session {
        let claims = CredentialClaims::peek(&self.token).ok();
        let user = self.user.unwrap_or_default();

        let user_id = Some(user.id)
            .filter(|id| !id.is_empty())
            .or_else(|| claims.as_ref().map(|c| c.sub.clone()));

        let role = user
            .role
            .as_deref()
            .and_then(Role::parse)
            .or_else(|| claims.as_ref().and_then(CredentialClaims::role))
            .or(Some(Role::Citizen));

        let wallet_address = user
            .wallet_address
            .as_deref()
            .and_then(WalletAddress::parse)
            .or_else(|| {
                claims
                    .as_ref()
                    .and_then(|c| c.wallet.as_deref())
                    .and_then(WalletAddress::parse)
            })
            .or_else(|| wallet.cloned());

        let email = user
            .email
            .or_else(|| claims.as_ref().and_then(|c| c.email.clone()));

        Session {
            wallet_address,
            bearer_credential: Some(self.token),
            role,
            user_id,
            email,
        }
    }
}

// =============================================================================
// Contract
// =============================================================================

/// Identity service as seen by the client.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, IdentityError>;

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, IdentityError>;

    /// Issue a fresh challenge for `wallet`.
    async fn request_nonce(&self, wallet: &WalletAddress) -> Result<String, IdentityError>;

    async fn verify_wallet(
        &self,
        request: &VerifyWalletRequest,
    ) -> Result<AuthResponse, IdentityError>;
}

/// [`IdentityApi`] over the backend's HTTP endpoints.
#[derive(Clone)]
pub struct HttpIdentityClient {
    api: ApiClient,
}

impl HttpIdentityClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityApi for HttpIdentityClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, IdentityError> {
        Ok(self.api.post_json("/auth/login", request, None).await?)
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, IdentityError> {
        Ok(self.api.post_json("/auth/signup", request, None).await?)
    }

    async fn request_nonce(&self, wallet: &WalletAddress) -> Result<String, IdentityError> {
        let response: NonceResponse = self
            .api
            .get_json(&format!("/auth/nonce/{}", wallet.as_str()))
            .await?;
        if response.nonce.trim().is_empty() {
            return Err(IdentityError::InvalidResponse("empty nonce".to_string()));
        }
        Ok(response.nonce)
    }

    async fn verify_wallet(
        &self,
        request: &VerifyWalletRequest,
    ) -> Result<AuthResponse, IdentityError> {
        Ok(self.api.post_json("/auth/verify-wallet", request, None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionStore;
    use mockito::Matcher;
    use serde_json::json;

    const WALLET: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn client(url: &str) -> HttpIdentityClient {
        let config = ClientConfig {
            api_url: url.to_string(),
            ..ClientConfig::default()
        };
        HttpIdentityClient::new(ApiClient::new(&config, SessionStore::in_memory()).unwrap())
    }

    #[test]
    fn session_prefers_user_profile() {
        let response = AuthResponse {
            token: "opaque".to_string(),
            user: Some(UserProfile {
                id: "u-9".to_string(),
                email: Some("citizen@example.com".to_string()),
                wallet_address: Some("0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266".to_string()),
                role: Some("admin".to_string()),
                share_profile: Some(true),
            }),
        };
        let session = response.into_session(None);
        assert_eq!(session.user_id.as_deref(), Some("u-9"));
        assert_eq!(session.role, Some(Role::Admin));
        assert_eq!(session.wallet_address.unwrap().as_str(), WALLET);
        assert_eq!(session.bearer_credential.as_deref(), Some("opaque"));
    }

    #[test]
    fn session_falls_back_to_verified_wallet() {
        let wallet = WalletAddress::parse(WALLET).unwrap();
        let response = AuthResponse {
            token: "opaque".to_string(),
            user: None,
        };
        let session = response.into_session(Some(&wallet));
        assert_eq!(session.wallet_address, Some(wallet));
        assert_eq!(session.role, Some(Role::Citizen));
        assert!(session.user_id.is_none());
    }

    #[tokio::test]
    async fn nonce_and_verify_use_backend_wire_format() {
        let mut server = mockito::Server::new_async().await;
        let _m1 = server
            .mock("GET", format!("/auth/nonce/{WALLET}").as_str())
            .with_status(200)
            .with_body(r#"{"nonce":"a1b2c3"}"#)
            .create_async()
            .await;
        let verify = server
            .mock("POST", "/auth/verify-wallet")
            .match_body(Matcher::Json(json!({
                "wallet_address": WALLET,
                "signature": "0xsig",
                "nonce": "a1b2c3"
            })))
            .with_status(200)
            .with_body(r#"{"token":"jwt","user":{"id":"u-1","walletAddress":null,"role":"citizen"}}"#)
            .create_async()
            .await;

        let identity = client(&server.url());
        let wallet = WalletAddress::parse(WALLET).unwrap();
        let nonce = identity.request_nonce(&wallet).await.unwrap();
        assert_eq!(nonce, "a1b2c3");

        let response = identity
            .verify_wallet(&VerifyWalletRequest {
                wallet_address: wallet,
                signature: "0xsig".to_string(),
                nonce,
            })
            .await
            .unwrap();
        assert_eq!(response.token, "jwt");
        verify.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_and_unavailable_are_distinguished() {
        let mut server = mockito::Server::new_async().await;
        let _m2 = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"detail":"Invalid credentials"}"#)
            .create_async()
            .await;
        let _m3 = server
            .mock("POST", "/auth/signup")
            .with_status(500)
            .with_body(r#"{"detail":"Failed to create user"}"#)
            .create_async()
            .await;

        let identity = client(&server.url());
        let err = identity
            .login(&LoginRequest {
                email: "a@b.c".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .err()
            .unwrap();
        assert_eq!(
            err,
            IdentityError::Rejected {
                status: 401,
                detail: "Invalid credentials".to_string()
            }
        );

        let err = identity
            .signup(&SignupRequest {
                email: "a@b.c".to_string(),
                password: "secret1".to_string(),
                wallet_address: WalletAddress::parse(WALLET).unwrap(),
                share_profile: false,
            })
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IdentityError::Unavailable(_)));
    }
}
