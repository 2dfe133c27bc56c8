// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP check executor: dial host:port; success is a completed dial
//! followed by a clean close.

use crate::checker::{race, CheckContext, Checker};
use async_trait::async_trait;
use tokio::net::TcpStream;
use warden_core::Error;
use warden_plan::TcpCheck;

pub struct TcpChecker {
    host: String,
    port: u16,
}

impl TcpChecker {
    pub fn new(cfg: &TcpCheck) -> Self {
        Self { host: cfg.host.clone(), port: cfg.port }
    }
}

#[async_trait]
impl Checker for TcpChecker {
    async fn check(&self, ctx: &CheckContext) -> Result<(), Error> {
        race(ctx, self.probe()).await
    }
}

impl TcpChecker {
    async fn probe(&self) -> Result<(), Error> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| Error::CheckFailure { message: e.to_string(), details: None })?;
        drop(stream);
        Ok(())
    }
}
