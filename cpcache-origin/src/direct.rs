use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::{OriginConfig, SessionConfig};
use crate::model::{CredentialContext, StandingsSnapshot};
use crate::request::OriginRequest;
use crate::session::{build_client, SendPretty as _};
use crate::validate::{self, RawResponse};
use crate::{Acquire, ContestMeta, FetchError, Outcome};

/// Calls the origin's internal endpoints with plain HTTP requests, replaying
/// the operator's session cookies.
#[derive(Debug, Clone)]
pub struct DirectAcquirer {
    client: Client,
    origin: OriginConfig,
}

impl DirectAcquirer {
    pub fn new(session: &SessionConfig, origin: OriginConfig) -> crate::Result<Self> {
        Ok(Self {
            client: build_client(session)?,
            origin,
        })
    }

    async fn execute(
        &self,
        request: &OriginRequest,
        ctx: &CredentialContext,
    ) -> Result<RawResponse, FetchError> {
        let res = request
            .to_reqwest(&self.client, ctx)
            .send_pretty()
            .await
            .map_err(|err| FetchError::transport(err.without_url()))?;
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|err| FetchError::transport(err.without_url()))?;
        debug!("Received {} bytes from {}", body.len(), request.url().path());
        Ok(RawResponse::new(status, body))
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
        match self.execute(&request, ctx).await {
            Ok(raw) => raw.classify(parse),
            Err(err) => Outcome::HardFailure(err),
        }
    }
}

#[async_trait]
impl Acquire for DirectAcquirer {
    async fn fetch_contest_meta(&self, ctx: &CredentialContext) -> Outcome<ContestMeta> {
        let request = OriginRequest::contest_data(&self.origin, ctx);
        self.fetch(request, ctx, validate::contest_meta).await
    }

    async fn fetch_standings(&self, ctx: &CredentialContext) -> Outcome<StandingsSnapshot> {
        let request = OriginRequest::rank(&self.origin, ctx);
        self.fetch(request, ctx, validate::standings).await
    }
}
