//! Minimal headless browser surface needed to replay origin calls from
//! inside a real page.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::FetchError;

mod chromium;

pub use chromium::ChromiumBrowser;

/// A cookie scoped to the origin's domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl BrowserCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".into(),
        }
    }
}

#[async_trait]
pub trait Browser: Send + Sync {
    /// Starts a fresh browser with an empty profile.
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, FetchError>;
}

/// A running browser. Must be closed with [`BrowserSession::close`].
#[async_trait]
pub trait BrowserSession: Send {
    async fn set_cookies(&mut self, cookies: &[BrowserCookie]) -> Result<(), FetchError>;

    async fn navigate(&mut self, url: &Url) -> Result<Box<dyn PageHandle>, FetchError>;

    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Waits until `selector` matches or `timeout` passes; returns whether
    /// it matched.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> bool;

    async fn title(&self) -> Result<Option<String>, FetchError>;

    /// Evaluates `script`, awaiting a returned promise.
    async fn evaluate(&self, script: &str) -> Result<Value, FetchError>;
}
