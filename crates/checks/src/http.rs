// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP check executor: a GET request is a success on any 2xx status.

use crate::checker::{race, CheckContext, CheckLimits, Checker};
use crate::details::build_details;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use warden_core::Error;
use warden_plan::HttpCheck;

pub struct HttpChecker {
    client: Client,
    url: String,
    headers: HashMap<String, String>,
    details_max_bytes: usize,
    details_max_lines: usize,
}

impl HttpChecker {
    pub fn new(cfg: &HttpCheck, limits: &CheckLimits) -> Self {
        Self {
            // Redirects follow the client's default policy.
            client: Client::new(),
            url: cfg.url.clone(),
            headers: cfg.headers.clone(),
            details_max_bytes: limits.details_max_bytes,
            details_max_lines: limits.details_max_lines,
        }
    }
}

#[async_trait]
impl Checker for HttpChecker {
    async fn check(&self, ctx: &CheckContext) -> Result<(), Error> {
        race(ctx, self.probe()).await
    }
}

impl HttpChecker {
    async fn probe(&self) -> Result<(), Error> {
        let mut request = self.client.get(&self.url);
        for (k, v) in &self.headers {
            request = request.header(k, v);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::CheckFailure { message: e.to_string(), details: None })?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();
        let cap = body.len().min(self.details_max_bytes);
        let details = build_details(&body[..cap], self.details_max_bytes, self.details_max_lines);
        Err(Error::CheckFailure {
            message: format!("unexpected status {status}"),
            details: Some(details),
        })
    }
}
