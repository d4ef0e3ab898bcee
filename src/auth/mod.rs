// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Obtains a bearer credential from the identity service.
//!
//! ## Paths
//!
//! - Email/password login and sign-up ([`PasswordAuth`])
//! - Wallet challenge/response ([`WalletAuthCoordinator`]): the wallet
//!   signs a single-use nonce and the service verifies the recovered
//!   address before issuing a credential
//!
//! [`LocalIdentityService`] implements the service side of both paths
//! in process, for tests and offline development.
//!
//! ## Security
//!
//! - Credentials are never inspected for authorization on the client;
//!   claims are only read to fill in session fields
//! - Private keys and bearer credentials are never logged

pub mod challenge;
pub mod claims;
pub mod error;
pub mod identity;
pub mod local;
pub mod roles;
pub mod signer;
pub mod wallet;

pub use challenge::{Challenge, ChallengeError, ChallengeStore};
pub use claims::CredentialClaims;
pub use error::AuthError;
pub use identity::{HttpIdentityClient, IdentityApi, IdentityError};
pub use local::LocalIdentityService;
pub use roles::Role;
pub use signer::{signer_from_source, LocalKeySigner, RemoteSigner, Signer, SignerError};
pub use wallet::{PasswordAuth, WalletAuthCoordinator};
