// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer credential claims.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::roles::Role;

/// Claims carried in a bearer credential issued by the identity service.
///
/// The client never verifies the credential; [`CredentialClaims::peek`]
/// only reads it so the session can be filled in and early expiry
/// detected. The server remains authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Subject (user id)
    pub sub: String,

    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Wallet address bound at verify time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("credential is not a readable token: {0}")]
pub struct MalformedCredential(String);

impl CredentialClaims {
    /// Decode claims without checking the signature or expiry.
    pub fn peek(token: &str) -> Result<Self, MalformedCredential> {
        let token_data = jsonwebtoken::dangerous::insecure_decode::<CredentialClaims>(token)
            .map_err(|e| MalformedCredential(e.to_string()))?;
        Ok(token_data.claims)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// Role claim, if present and recognized.
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }
}
