// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External collaborators a worker depends on but doesn't own: credential
//! lookup and page rendering. Defined as trait objects so `qo-crawler` can be
//! tested against in-memory fakes without a network (§6).

use async_trait::async_trait;
use cookie::Cookie;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("unknown credential: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<String, CredentialError>;
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("timed out rendering {0}")]
    Timeout(String),
    #[error("render failed: {0}")]
    Failed(String),
}

/// A fetched page: raw HTML plus the HTTP status it arrived with.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub status: u16,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, RenderError>;
    async fn set_cookies(&self, cookies: Vec<Cookie<'static>>) -> Result<(), RenderError>;
}
