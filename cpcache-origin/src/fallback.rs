use async_trait::async_trait;
use tokio::time::{timeout, Instant};
use tracing::{info, warn};

use crate::browser::{Browser, BrowserCookie, BrowserSession};
use crate::config::{BrowserConfig, OriginConfig};
use crate::model::{CredentialContext, StandingsSnapshot};
use crate::request::OriginRequest;
use crate::validate::{self, RawResponse};
use crate::{Acquire, ContestMeta, FetchError, Outcome};

/// Replays origin calls from inside a real browser page, for when plain
/// requests are turned away by an anti-bot layer.
///
/// Every call launches its own browser and closes it exactly once, whatever
/// the outcome.
pub struct BrowserAcquirer<B> {
    browser: B,
    origin: OriginConfig,
    conf: BrowserConfig,
}

impl<B: Browser> BrowserAcquirer<B> {
    pub fn new(browser: B, origin: OriginConfig, conf: BrowserConfig) -> Self {
        Self {
            browser,
            origin,
            conf,
        }
    }

    async fn fetch<T>(
        &self,
        request: Result<OriginRequest, FetchError>,
        ctx: &CredentialContext,
        parse: fn(&str) -> Outcome<T>,
    ) -> Outcome<T> {
        let request = match request {
            Ok(request) => request,
            Err(err) => return Outcome::HardFailure(err),
        };
        let mut session = match self.browser.launch().await {
            Ok(session) => session,
            Err(err) => return Outcome::HardFailure(err),
        };
        let result = self.run(session.as_mut(), &request, ctx).await;
        session.close().await;
        match result {
            Ok(raw) => raw.classify(parse),
            Err(err) => Outcome::HardFailure(err),
        }
    }

    async fn run(
        &self,
        session: &mut dyn BrowserSession,
        request: &OriginRequest,
        ctx: &CredentialContext,
    ) -> Result<RawResponse, FetchError> {
        let cookies = self.cookies(ctx)?;
        let page_url = self
            .origin
            .contest_page_url(ctx.contest_id())
            .map_err(|err| FetchError::configuration(format!("{:#}", err)))?;
        let nav_timeout = self.conf.navigation_timeout();
        let deadline = Instant::now() + nav_timeout;

        session.set_cookies(&cookies).await?;
        let page = timeout(nav_timeout, session.navigate(&page_url))
            .await
            .map_err(|_| {
                FetchError::transport(format!(
                    "Navigation did not finish within {:?}",
                    nav_timeout
                ))
            })??;

        let selector = self.origin.loaded_selector();
        let remaining = deadline.saturating_duration_since(Instant::now());
        let loaded = timeout(remaining, page.wait_for(selector, remaining))
            .await
            .unwrap_or(false);
        if !loaded {
            warn!("Page did not show {} in time, continuing", selector);
        }

        let title = page.title().await?.unwrap_or_default();
        if self.origin.is_challenge_title(&title) {
            return Err(FetchError::Challenge(format!("page title is {:?}", title)));
        }

        info!("Replaying {} from inside the page", request.url().path());
        let value = timeout(nav_timeout, page.evaluate(&request.to_script()))
            .await
            .map_err(|_| {
                FetchError::transport(format!("In-page request did not finish within {:?}", nav_timeout))
            })??;
        let status = value.get("status").and_then(|status| status.as_u64());
        let body = value.get("body").and_then(|body| body.as_str());
        match (status, body) {
            (Some(status), Some(body)) => Ok(RawResponse::new(status as u16, body)),
            _ => Err(FetchError::transport("In-page request returned an unexpected value")),
        }
    }

    fn cookies(&self, ctx: &CredentialContext) -> Result<Vec<BrowserCookie>, FetchError> {
        let domain = self
            .origin
            .cookie_domain()
            .ok_or_else(|| FetchError::configuration("origin base url has no host"))?;
        let cookies = ctx
            .cookie_pairs()
            .into_iter()
            .map(|(name, value)| BrowserCookie::new(name, value, domain))
            .collect::<Vec<_>>();
        if cookies.is_empty() {
            return Err(FetchError::configuration("session cookies contain no valid cookie"));
        }
        Ok(cookies)
    }
}

#[async_trait]
impl<B: Browser> Acquire for BrowserAcquirer<B> {
    async fn fetch_contest_meta(&self, ctx: &CredentialContext) -> Outcome<ContestMeta> {
        let request = OriginRequest::contest_data(&self.origin, ctx);
        self.fetch(request, ctx, validate::contest_meta).await
    }

    async fn fetch_standings(&self, ctx: &CredentialContext) -> Outcome<StandingsSnapshot> {
        let request = OriginRequest::rank(&self.origin, ctx);
        self.fetch(request, ctx, validate::standings).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serde_json::{json, Value};
    use url::Url;

    use super::*;
    use crate::browser::PageHandle;

    #[derive(Debug, Clone)]
    enum Script {
        Answer(Value),
        NavigationHangs,
        NavigationFails,
        Challenge,
        EvaluationFails,
        LaunchFails,
        CookiesFail,
    }

    #[derive(Debug, Default)]
    struct Log {
        events: Vec<String>,
    }

    struct FakeBrowser {
        script: Script,
        log: Arc<Mutex<Log>>,
    }

    impl FakeBrowser {
        fn new(script: Script) -> (Self, Arc<Mutex<Log>>) {
            let log = Arc::new(Mutex::new(Log::default()));
            (
                Self {
                    script,
                    log: log.clone(),
                },
                log,
            )
        }
    }

    fn record(log: &Arc<Mutex<Log>>, event: impl Into<String>) {
        log.lock().unwrap().events.push(event.into());
    }

    #[async_trait]
    impl Browser for FakeBrowser {
        async fn launch(&self) -> Result<Box<dyn BrowserSession>, FetchError> {
            if let Script::LaunchFails = self.script {
                return Err(FetchError::transport("no browser"));
            }
            record(&self.log, "launch");
            Ok(Box::new(FakeSession {
                script: self.script.clone(),
                log: self.log.clone(),
            }))
        }
    }

    struct FakeSession {
        script: Script,
        log: Arc<Mutex<Log>>,
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn set_cookies(&mut self, cookies: &[BrowserCookie]) -> Result<(), FetchError> {
            for cookie in cookies {
                record(
                    &self.log,
                    format!("cookie {}={} @{}{}", cookie.name, cookie.value, cookie.domain, cookie.path),
                );
            }
            match self.script {
                Script::CookiesFail => Err(FetchError::transport("Network.setCookies failed")),
                _ => Ok(()),
            }
        }

        async fn navigate(&mut self, url: &Url) -> Result<Box<dyn PageHandle>, FetchError> {
            record(&self.log, format!("navigate {}", url));
            match self.script {
                Script::NavigationHangs => futures::future::pending().await,
                Script::NavigationFails => Err(FetchError::transport("net::ERR_NAME_NOT_RESOLVED")),
                _ => Ok(Box::new(FakePage {
                    script: self.script.clone(),
                    log: self.log.clone(),
                })),
            }
        }

        async fn close(self: Box<Self>) {
            record(&self.log, "close");
        }
    }

    struct FakePage {
        script: Script,
        log: Arc<Mutex<Log>>,
    }

    #[async_trait]
    impl PageHandle for FakePage {
        async fn wait_for(&self, selector: &str, _timeout: Duration) -> bool {
            record(&self.log, format!("wait {}", selector));
            !matches!(self.script, Script::Challenge)
        }

        async fn title(&self) -> Result<Option<String>, FetchError> {
            Ok(Some(match self.script {
                Script::Challenge => "Just a moment...".into(),
                _ => "Weekly #12 - Virtual Judge".into(),
            }))
        }

        async fn evaluate(&self, script: &str) -> Result<Value, FetchError> {
            record(&self.log, "evaluate");
            assert!(script.contains("credentials: \"include\""));
            match &self.script {
                Script::Answer(value) => Ok(value.clone()),
                Script::EvaluationFails => Err(FetchError::transport("TypeError: Failed to fetch")),
                _ => unreachable!(),
            }
        }
    }

    fn acquirer(browser: FakeBrowser) -> BrowserAcquirer<FakeBrowser> {
        let origin = OriginConfig::default()
            .with_base_url(Url::parse("https://judge.example.com").unwrap());
        let conf = BrowserConfig::default().with_navigation_timeout(Duration::from_secs(60));
        BrowserAcquirer::new(browser, origin, conf)
    }

    fn ctx() -> CredentialContext {
        CredentialContext::new("JSESSIONID=abc; ; remember=1", "42", None).unwrap()
    }

    fn events(log: &Arc<Mutex<Log>>) -> Vec<String> {
        log.lock().unwrap().events.clone()
    }

    fn closes(log: &Arc<Mutex<Log>>) -> usize {
        events(log).iter().filter(|e| *e == "close").count()
    }

    #[tokio::test]
    async fn test_success_injects_cookies_before_navigation() {
        let (browser, log) = FakeBrowser::new(Script::Answer(json!({
            "status": 200,
            "body": r#"{"title":"Weekly #12"}"#,
        })));
        let meta = acquirer(browser)
            .fetch_contest_meta(&ctx())
            .await
            .into_result()
            .unwrap();
        assert_eq!(meta.title, "Weekly #12");
        assert_eq!(
            events(&log),
            vec![
                "launch",
                "cookie JSESSIONID=abc @judge.example.com/",
                "cookie remember=1 @judge.example.com/",
                "navigate https://judge.example.com/contest/42",
                "wait #contest-main",
                "evaluate",
                "close",
            ]
        );
    }

    #[tokio::test]
    async fn test_challenge_is_hard_failure() {
        let (browser, log) = FakeBrowser::new(Script::Challenge);
        match acquirer(browser).fetch_standings(&ctx()).await {
            Outcome::HardFailure(FetchError::Challenge(message)) => {
                assert!(message.contains("Just a moment..."))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!events(&log).contains(&"evaluate".to_owned()));
        assert_eq!(closes(&log), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_timeout_closes_browser() {
        let (browser, log) = FakeBrowser::new(Script::NavigationHangs);
        match acquirer(browser).fetch_standings(&ctx()).await {
            Outcome::HardFailure(FetchError::Transport(message)) => {
                assert!(message.contains("Navigation did not finish"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(closes(&log), 1);
    }

    #[tokio::test]
    async fn test_navigation_and_evaluation_errors_close_browser() {
        for script in vec![Script::NavigationFails, Script::EvaluationFails] {
            let (browser, log) = FakeBrowser::new(script.clone());
            match acquirer(browser).fetch_contest_meta(&ctx()).await {
                Outcome::HardFailure(FetchError::Transport(_)) => {}
                other => panic!("unexpected {:?} for {:?}", other, script),
            }
            assert_eq!(closes(&log), 1, "{:?}", script);
        }
    }

    #[tokio::test]
    async fn test_cookie_injection_failure_closes_browser() {
        let (browser, log) = FakeBrowser::new(Script::CookiesFail);
        match acquirer(browser).fetch_standings(&ctx()).await {
            Outcome::HardFailure(FetchError::Transport(message)) => {
                assert!(message.contains("setCookies"))
            }
            other => panic!("unexpected {:?}", other),
        }
        let events = events(&log);
        assert!(!events.iter().any(|e| e.starts_with("navigate") || e == "evaluate"));
        assert_eq!(closes(&log), 1);
    }

    #[tokio::test]
    async fn test_no_usable_cookie_closes_browser() {
        let (browser, log) = FakeBrowser::new(Script::Answer(json!({"status": 200, "body": "{}"})));
        let ctx = CredentialContext::new("garbage", "42", None).unwrap();
        assert!(ctx.cookie_pairs().is_empty());
        match acquirer(browser).fetch_contest_meta(&ctx).await {
            Outcome::HardFailure(FetchError::Configuration(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(events(&log), vec!["launch", "close"]);
    }

    #[tokio::test]
    async fn test_launch_failure() {
        let (browser, log) = FakeBrowser::new(Script::LaunchFails);
        let outcome = acquirer(browser).fetch_contest_meta(&ctx()).await;
        assert_eq!(outcome, Outcome::HardFailure(FetchError::transport("no browser")));
        assert!(events(&log).is_empty());
    }

    #[tokio::test]
    async fn test_in_page_response_is_validated() {
        let (browser, log) = FakeBrowser::new(Script::Answer(json!({
            "status": 200,
            "body": "<html><title>Login</title></html>",
        })));
        match acquirer(browser).fetch_standings(&ctx()).await {
            Outcome::PartialFailure { reason, .. } => assert!(reason.contains("Login")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(closes(&log), 1);

        let (browser, _) = FakeBrowser::new(Script::Answer(json!("not an object")));
        assert!(matches!(
            acquirer(browser).fetch_standings(&ctx()).await,
            Outcome::HardFailure(FetchError::Transport(_))
        ));
    }
}
