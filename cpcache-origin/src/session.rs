use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{info, warn};
use url::Url;

use crate::config::SessionConfig;
use crate::Result;

pub fn build_client(conf: &SessionConfig) -> Result<Client> {
    Client::builder()
        .timeout(conf.timeout())
        .user_agent(conf.user_agent().as_str())
        .redirect(Policy::limited(5))
        .build()
        .context("Could not build http client")
}

#[async_trait]
pub trait SendPretty {
    /// Sends the request once, logging method, url and status.
    async fn send_pretty(self) -> reqwest::Result<Response>;
}

#[async_trait]
impl SendPretty for RequestBuilder {
    async fn send_pretty(self) -> reqwest::Result<Response> {
        let (client, req) = self.build_split();
        let req = req?;
        let method = req.method().clone();
        let url = without_query(req.url());
        let result = client.execute(req).await;
        match &result {
            Ok(res) => info!("{:7} {} ... {}", method.as_str(), url, res.status()),
            Err(_) => warn!("{:7} {} ... failed", method.as_str(), url),
        }
        result
    }
}

// query strings may carry the contest password
fn without_query(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url
}
