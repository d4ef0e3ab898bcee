// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! MineGuard Client - Evidence Submission Pipeline
//!
//! Client-side core of the MineGuard reporting service: citizens
//! authenticate by password or wallet signature, pin photo/video evidence
//! to a content-addressed store, and anchor the report on the
//! ledger-backed service.
//!
//! ## Modules
//!
//! - `auth` - Password and wallet challenge/response authentication
//! - `content` - Content store uploads (media and metadata)
//! - `ledger` - On-chain submission and report status queries
//! - `submission` - Report submission state machine
//! - `reconciler` - Local report collection
//! - `session` - Persisted identity
//! - `storage` - Local files and the embedded report database
//! - `client` - [`MineGuardClient`] facade

pub mod auth;
pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod http;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod reconciler;
pub mod session;
pub mod storage;
pub mod submission;
pub mod validation;

pub use client::{ClientError, MineGuardClient};
pub use config::ClientConfig;
