// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared HTTP client for the backend service.
//!
//! The bearer credential is read from the [`SessionStore`] when each
//! request is built, never captured at construction time.

use std::time::Duration;

use reqwest::{multipart::Form, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            http,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.bearer().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.authorize(self.http.get(self.url(path))).await;
        self.send("GET", path, builder).await
    }

    /// POST a JSON body. `timeout` overrides the client-wide deadline.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.http.post(self.url(path)).json(body);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let builder = self.authorize(builder).await;
        self.send("POST", path, builder).await
    }

    /// POST without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.authorize(self.http.post(self.url(path))).await;
        self.send("POST", path, builder).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let builder = self.authorize(self.http.post(self.url(path)).multipart(form)).await;
        self.send("POST", path, builder).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::from_reqwest(&e))?;
        let status = response.status();
        debug!(method, path, status = status.as_u16(), "Backend responded");

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(method, path, status = status.as_u16(), error = %e, "Error body unreadable");
                    String::new()
                }
            };
            return Err(ApiError::from_status(status, &body));
        }

        let bytes = response.bytes().await.map_err(|e| ApiError::from_reqwest(&e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("{method} {path}: {e}")))
    }
}
