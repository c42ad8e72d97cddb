use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt as _;
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use url::Url;

use super::{Browser, BrowserCookie, BrowserSession, PageHandle};
use crate::config::BrowserConfig;
use crate::FetchError;

/// Headless Chromium driven over the devtools protocol.
#[derive(Debug, Clone)]
pub struct ChromiumBrowser {
    conf: BrowserConfig,
}

impl ChromiumBrowser {
    pub fn new(conf: BrowserConfig) -> Self {
        Self { conf }
    }

    fn cdp_config(&self, profile: &TempDir) -> Result<CdpConfig, FetchError> {
        let mut builder = CdpConfig::builder()
            .user_data_dir(profile.path())
            .request_timeout(self.conf.navigation_timeout());
        if let Some(executable) = self.conf.executable() {
            builder = builder.chrome_executable(executable);
        }
        if self.conf.no_sandbox() {
            builder = builder.no_sandbox();
        }
        builder
            .build()
            .map_err(|err| FetchError::configuration(format!("Invalid browser config: {}", err)))
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, FetchError> {
        let profile = TempDir::new().map_err(|err| {
            FetchError::transport(format!("Could not create browser profile: {}", err))
        })?;
        let cdp_conf = self.cdp_config(&profile)?;
        let (browser, mut handler) = CdpBrowser::launch(cdp_conf)
            .await
            .map_err(|err| FetchError::transport(format!("Could not launch browser: {}", err)))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        debug!("Launched browser with profile {}", profile.path().display());
        Ok(Box::new(ChromiumSession {
            browser,
            handler,
            page: None,
            poll_interval: self.conf.poll_interval(),
            _profile: profile,
        }))
    }
}

struct ChromiumSession {
    browser: CdpBrowser,
    handler: JoinHandle<()>,
    page: Option<Page>,
    poll_interval: Duration,
    // removed on drop, after the browser has exited
    _profile: TempDir,
}

impl ChromiumSession {
    async fn page(&mut self) -> Result<Page, FetchError> {
        if let Some(page) = &self.page {
            return Ok(page.clone());
        }
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|err| FetchError::transport(format!("Could not open page: {}", err)))?;
        self.page = Some(page.clone());
        Ok(page)
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn set_cookies(&mut self, cookies: &[BrowserCookie]) -> Result<(), FetchError> {
        let params = cookies
            .iter()
            .map(|cookie| {
                CookieParam::builder()
                    .name(cookie.name.as_str())
                    .value(cookie.value.as_str())
                    .domain(cookie.domain.as_str())
                    .path(cookie.path.as_str())
                    .build()
                    .map_err(FetchError::transport)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let page = self.page().await?;
        page.set_cookies(params)
            .await
            .map_err(|err| FetchError::transport(format!("Could not set cookies: {}", err)))?;
        Ok(())
    }

    async fn navigate(&mut self, url: &Url) -> Result<Box<dyn PageHandle>, FetchError> {
        let page = self.page().await?;
        page.goto(url.as_str())
            .await
            .map_err(|err| FetchError::transport(format!("Could not navigate: {}", err)))?;
        Ok(Box::new(ChromiumPage {
            page,
            poll_interval: self.poll_interval,
        }))
    }

    async fn close(self: Box<Self>) {
        let mut session = self;
        if let Err(err) = session.browser.close().await {
            warn!("Could not close browser: {}", err);
        }
        if let Err(err) = session.browser.wait().await {
            warn!("Could not wait for browser to exit: {}", err);
        }
        session.handler.abort();
        debug!("Closed browser");
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

struct ChromiumPage {
    page: Page,
    poll_interval: Duration,
}

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn wait_for(&self, selector: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return true;
            }
            if Instant::now() + self.poll_interval > deadline {
                return false;
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn title(&self) -> Result<Option<String>, FetchError> {
        self.page
            .get_title()
            .await
            .map_err(|err| FetchError::transport(format!("Could not read page title: {}", err)))
    }

    async fn evaluate(&self, script: &str) -> Result<Value, FetchError> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(FetchError::transport)?;
        self.page
            .evaluate_expression(params)
            .await
            .map_err(|err| FetchError::transport(format!("In-page request failed: {}", err)))?
            .into_value()
            .map_err(|err| FetchError::transport(format!("Unexpected evaluation result: {}", err)))
    }
}
