// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet signing capability.
//!
//! A [`Signer`] produces EIP-191 `personal_sign` signatures without
//! exposing its key. Two backings live here:
//!
//! - [`LocalKeySigner`] - key held in process (hex or PEM import)
//! - [`RemoteSigner`] - external wallet over JSON-RPC (`eth_accounts`,
//!   `personal_sign`)
//!
//! Callers may supply any other implementation (e.g. a browser wallet
//! bridge).

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::hex;
use alloy::primitives::Signature;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use async_trait::async_trait;
use k256::SecretKey;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::SignerSource;
use crate::models::WalletAddress;

/// JSON-RPC error code for "user rejected request" (EIP-1193).
const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    #[error("signer not configured: {0}")]
    NotConfigured(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// The key holder refused. Not retryable without user action.
    #[error("signature rejected: {0}")]
    Rejected(String),

    #[error("signing failed: {0}")]
    Failed(String),
}

pub type SignerResult<T> = Result<T, SignerError>;

/// Signing capability used by wallet authentication.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Address whose key produces the signatures.
    async fn address(&self) -> SignerResult<WalletAddress>;

    /// Sign the UTF-8 message with the EIP-191 prefix. Returns `0x` hex.
    async fn sign_message(&self, message: &str) -> SignerResult<String>;
}

fn address_of(address: alloy::primitives::Address) -> SignerResult<WalletAddress> {
    WalletAddress::parse(&hex::encode_prefixed(address.as_slice()))
        .ok_or_else(|| SignerError::Failed("signer produced a malformed address".to_string()))
}

/// Recover the address that produced an EIP-191 signature over `message`.
pub fn recover_signer(message: &str, signature_hex: &str) -> SignerResult<WalletAddress> {
    let bytes = hex::decode(signature_hex.trim())
        .map_err(|e| SignerError::Failed(format!("signature is not hex: {e}")))?;
    let signature = Signature::try_from(bytes.as_slice())
        .map_err(|e| SignerError::Failed(format!("malformed signature: {e}")))?;
    let address = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| SignerError::Failed(format!("recovery failed: {e}")))?;
    address_of(address)
}

// =============================================================================
// Local Key Signer
// =============================================================================

/// Signer backed by a private key in process memory.
pub struct LocalKeySigner {
    inner: PrivateKeySigner,
    address: WalletAddress,
}

impl LocalKeySigner {
    fn from_signer(inner: PrivateKeySigner) -> SignerResult<Self> {
        let address = address_of(inner.address())?;
        Ok(Self { inner, address })
    }

    /// Load from a hex private key (with or without `0x`).
    pub fn from_hex(hex_key: &str) -> SignerResult<Self> {
        let trimmed = hex_key.trim();
        let key = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let inner: PrivateKeySigner = key
            .parse()
            .map_err(|e| SignerError::InvalidKey(format!("{e}")))?;
        Self::from_signer(inner)
    }

    /// Load from a PEM private key (SEC1 or PKCS#8).
    pub fn from_pem(pem_bytes: &[u8]) -> SignerResult<Self> {
        Self::from_hex(&pem_to_hex(pem_bytes)?)
    }

    pub fn from_pem_file(path: &Path) -> SignerResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            SignerError::NotConfigured(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_pem(&bytes)
    }

    /// Fresh random key (development and tests).
    pub fn random() -> SignerResult<Self> {
        Self::from_signer(PrivateKeySigner::random())
    }

    pub fn wallet_address(&self) -> &WalletAddress {
        &self.address
    }
}

#[async_trait]
impl Signer for LocalKeySigner {
    async fn address(&self) -> SignerResult<WalletAddress> {
        Ok(self.address.clone())
    }

    async fn sign_message(&self, message: &str) -> SignerResult<String> {
        let signature = self
            .inner
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| SignerError::Failed(e.to_string()))?;
        Ok(hex::encode_prefixed(signature.as_bytes()))
    }
}

/// Parse a private key from PEM format to hex string.
///
/// Accepts SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(SignerError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> SignerResult<String> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SignerError::InvalidKey(format!("Invalid UTF-8: {e}")))?;

    let pem = pem::parse(pem_str.trim())
        .map_err(|e| SignerError::InvalidKey(format!("Invalid PEM: {e}")))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| {
            use k256::pkcs8::DecodePrivateKey;
            SecretKey::from_pkcs8_der(pem.contents())
        })
        .map_err(|e| SignerError::InvalidKey(format!("Invalid key format: {e}")))?;

    Ok(hex::encode(secret_key.to_bytes()))
}

// =============================================================================
// Remote Signer
// =============================================================================

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Signer that forwards to an external wallet over JSON-RPC.
///
/// The key never enters this process.
pub struct RemoteSigner {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RemoteSigner {
    pub fn new(url: impl Into<String>, timeout: Duration) -> SignerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SignerError::Failed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> SignerResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SignerError::Failed(format!("{method} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SignerError::Failed(format!(
                "{method} returned {status}: {body}"
            )));
        }

        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|e| SignerError::Failed(format!("{method} invalid JSON: {e}")))?;

        if let Some(error) = rpc.error {
            debug!(method, code = error.code, "Remote signer returned an error");
            return Err(if error.code == USER_REJECTED_CODE {
                SignerError::Rejected(error.message)
            } else {
                SignerError::Failed(format!("{method}: {} ({})", error.message, error.code))
            });
        }

        rpc.result
            .ok_or_else(|| SignerError::Failed(format!("{method}: response has no result")))
    }
}

#[async_trait]
impl Signer for RemoteSigner {
    async fn address(&self) -> SignerResult<WalletAddress> {
        let result = self.call("eth_accounts", json!([])).await?;
        let first = result
            .as_array()
            .and_then(|accounts| accounts.first())
            .and_then(Value::as_str)
            .ok_or_else(|| SignerError::NotConfigured("wallet exposes no accounts".to_string()))?;
        WalletAddress::parse(first)
            .ok_or_else(|| SignerError::Failed(format!("wallet returned a malformed address: {first}")))
    }

    async fn sign_message(&self, message: &str) -> SignerResult<String> {
        let address = self.address().await?;
        let params = json!([hex::encode_prefixed(message.as_bytes()), address.as_str()]);
        let result = self.call("personal_sign", params).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SignerError::Failed("personal_sign result is not a string".to_string()))
    }
}

/// Build the signer selected by configuration, if any.
pub fn signer_from_source(
    source: &SignerSource,
    timeout: Duration,
) -> SignerResult<Option<Arc<dyn Signer>>> {
    let signer: Arc<dyn Signer> = match source {
        SignerSource::Key(key) => Arc::new(LocalKeySigner::from_hex(key)?),
        SignerSource::KeyPath(path) => Arc::new(LocalKeySigner::from_pem_file(path)?),
        SignerSource::Remote(url) => Arc::new(RemoteSigner::new(url.as_str(), timeout)?),
        SignerSource::None => return Ok(None),
    };
    Ok(Some(signer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::pkcs8::{EncodePrivateKey, LineEnding};

    // Well-known development key (anvil/hardhat account 0)
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[tokio::test]
    async fn hex_key_yields_lowercase_address() {
        let signer = LocalKeySigner::from_hex(DEV_KEY).unwrap();
        assert_eq!(signer.address().await.unwrap().as_str(), DEV_ADDRESS);
    }

    #[test]
    fn bad_hex_key_is_rejected() {
        assert!(matches!(
            LocalKeySigner::from_hex("0x1234"),
            Err(SignerError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn signature_recovers_to_signer() {
        let signer = LocalKeySigner::from_hex(DEV_KEY).unwrap();
        let signature = signer.sign_message("5f2b9c1e0a7d4e3f").await.unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 2 + 65 * 2);

        let recovered = recover_signer("5f2b9c1e0a7d4e3f", &signature).unwrap();
        assert_eq!(recovered.as_str(), DEV_ADDRESS);

        let other = recover_signer("a different nonce", &signature).unwrap();
        assert_ne!(other.as_str(), DEV_ADDRESS);
    }

    #[tokio::test]
    async fn pkcs8_pem_matches_hex_key() {
        let raw = hex::decode(DEV_KEY).unwrap();
        let secret = SecretKey::from_slice(&raw).unwrap();
        let pem = secret.to_pkcs8_pem(LineEnding::LF).unwrap();

        assert_eq!(pem_to_hex(pem.as_bytes()).unwrap(), DEV_KEY.trim_start_matches("0x"));
        let signer = LocalKeySigner::from_pem(pem.as_bytes()).unwrap();
        assert_eq!(signer.address().await.unwrap().as_str(), DEV_ADDRESS);
    }

    #[test]
    fn garbage_pem_is_rejected() {
        assert!(pem_to_hex(b"-----BEGIN NOTHING-----").is_err());
    }

    #[tokio::test]
    async fn remote_signer_speaks_json_rpc() {
        let local = LocalKeySigner::from_hex(DEV_KEY).unwrap();
        let expected = local.sign_message("nonce-1").await.unwrap();

        let mut server = mockito::Server::new_async().await;
        let _m1 = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({ "method": "eth_accounts" })))
            .with_status(200)
            .with_body(format!(r#"{{"jsonrpc":"2.0","id":1,"result":["{DEV_ADDRESS}"]}}"#))
            .create_async()
            .await;
        let _m2 = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({
                "method": "personal_sign",
                "params": [hex::encode_prefixed("nonce-1".as_bytes()), DEV_ADDRESS]
            })))
            .with_status(200)
            .with_body(format!(r#"{{"jsonrpc":"2.0","id":2,"result":"{expected}"}}"#))
            .create_async()
            .await;

        let remote = RemoteSigner::new(server.url(), Duration::from_secs(5)).unwrap();
        assert_eq!(remote.address().await.unwrap().as_str(), DEV_ADDRESS);
        assert_eq!(remote.sign_message("nonce-1").await.unwrap(), expected);
    }

    #[tokio::test]
    async fn remote_user_rejection_is_distinct() {
        let mut server = mockito::Server::new_async().await;
        let _m3 = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({ "method": "eth_accounts" })))
            .with_status(200)
            .with_body(format!(r#"{{"jsonrpc":"2.0","id":1,"result":["{DEV_ADDRESS}"]}}"#))
            .create_async()
            .await;
        let _m4 = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({ "method": "personal_sign" })))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":2,"error":{"code":4001,"message":"User rejected the request."}}"#)
            .create_async()
            .await;

        let remote = RemoteSigner::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = remote.sign_message("nonce-1").await.unwrap_err();
        assert!(matches!(err, SignerError::Rejected(_)));
    }

    #[test]
    fn no_source_means_no_signer() {
        let signer = signer_from_source(&SignerSource::None, Duration::from_secs(1)).unwrap();
        assert!(signer.is_none());
    }
}
