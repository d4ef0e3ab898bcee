// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use reqwest::StatusCode;
use serde::Deserialize;

/// Classified failure of a single backend call.
///
/// Component clients map this into their own error taxonomy; the
/// distinction that matters most is whether the request could have had
/// a server-side effect (`Timeout`, `Transport`, `InvalidResponse`) or
/// definitely did not (`Connect`, and any non-2xx status).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 401/403: credential missing, expired or insufficient.
    #[error("unauthorized ({status}): {detail}")]
    Unauthorized { status: u16, detail: String },

    /// Any other 4xx.
    #[error("request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// 5xx.
    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    /// The call exceeded its deadline; the server may have acted on it.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The request never reached the server.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The connection broke mid-exchange.
    #[error("transport error: {0}")]
    Transport(String),

    /// 2xx with a body that does not match the expected schema.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built locally.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    /// Build from a non-success status and its raw body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = extract_detail(body);
        let code = status.as_u16();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized {
                status: code,
                detail,
            },
            s if s.is_server_error() => ApiError::Server {
                status: code,
                detail,
            },
            _ => ApiError::Rejected {
                status: code,
                detail,
            },
        }
    }

    /// Classify a `reqwest` failure that happened before a status arrived.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        // A connect failure never delivered the request, even if it timed out.
        if err.is_connect() {
            ApiError::Connect(err.to_string())
        } else if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": ...}`, `{"message": ...}` and `{"error": ...}`;
/// falls back to the raw text.
fn extract_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let detail = match parsed.detail {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
            None => None,
        };
        if let Some(msg) = detail.or(parsed.message).or(parsed.error) {
            return msg;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.to_string()
    }
}
