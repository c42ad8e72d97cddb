use std::collections::BTreeMap;

use maplit::btreemap;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Client, Method, RequestBuilder};
use url::Url;

use crate::config::OriginConfig;
use crate::model::CredentialContext;
use crate::FetchError;

/// One call against the origin's internal endpoints.
///
/// Both strategies issue the same calls; the direct one through reqwest and
/// the browser one as an in-page `fetch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginRequest {
    method: Method,
    url: Url,
    form: BTreeMap<&'static str, String>,
}

impl OriginRequest {
    pub fn contest_data(origin: &OriginConfig, ctx: &CredentialContext) -> Result<Self, FetchError> {
        let url = origin.contest_data_url().map_err(invalid_url)?;
        let form = btreemap! {
            "id" => ctx.contest_id().to_string(),
            "password" => ctx.contest_password().clone().unwrap_or_default(),
        };
        Ok(Self {
            method: Method::POST,
            url,
            form,
        })
    }

    pub fn rank(origin: &OriginConfig, ctx: &CredentialContext) -> Result<Self, FetchError> {
        let url = origin
            .rank_url(ctx.contest_id(), ctx.contest_password().as_deref())
            .map_err(invalid_url)?;
        Ok(Self {
            method: Method::GET,
            url,
            form: BTreeMap::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn to_reqwest(&self, client: &Client, ctx: &CredentialContext) -> RequestBuilder {
        let builder = client
            .request(self.method.clone(), self.url.clone())
            .header(ACCEPT, "application/json, text/plain, */*")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(COOKIE, ctx.cookies().as_str());
        if self.method == Method::POST {
            builder.form(&self.form)
        } else {
            builder
        }
    }

    /// Script performing this request from inside a page of the origin.
    ///
    /// Evaluates to `{status, body}`; the session cookies are sent by the
    /// browser itself.
    pub fn to_script(&self) -> String {
        // serializing strings and string maps never fails
        let url = serde_json::to_string(self.url.as_str()).unwrap_or_default();
        let method = serde_json::to_string(self.method.as_str()).unwrap_or_default();
        let body = if self.method == Method::POST {
            let form = serde_json::to_string(&self.form).unwrap_or_else(|_| "{}".into());
            format!("new URLSearchParams({}).toString()", form)
        } else {
            "undefined".into()
        };
        format!(
            r#"(async () => {{
  const response = await fetch({url}, {{
    method: {method},
    credentials: "include",
    headers: {{
      "Accept": "application/json, text/plain, */*",
      "Content-Type": "application/x-www-form-urlencoded; charset=UTF-8",
      "X-Requested-With": "XMLHttpRequest"
    }},
    body: {body}
  }});
  return {{ status: response.status, body: await response.text() }};
}})()"#,
            url = url,
            method = method,
            body = body
        )
    }
}

fn invalid_url(err: anyhow::Error) -> FetchError {
    FetchError::configuration(format!("{:#}", err))
}
