use anyhow::Context as _;
use getset::Getters;
use serde::{Deserialize, Serialize};
use url::Url;

use cpcache_util::model::ContestId;

use crate::Result;

/// Where the origin keeps its pages and internal endpoints.
#[derive(Serialize, Deserialize, Getters, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(default)]
#[get = "pub"]
pub struct OriginConfig {
    base_url: Url,
    contest_data_path: String,
    rank_path: String,
    contest_page_path: String,
    loaded_selector: String,
    challenge_titles: Vec<String>,
}

impl OriginConfig {
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Endpoint answering contest metadata to a form POST.
    pub fn contest_data_url(&self) -> Result<Url> {
        self.join(&self.contest_data_path)
    }

    /// Endpoint answering standings, with the password as a query parameter
    /// when the contest has one.
    pub fn rank_url(&self, contest_id: &ContestId, password: Option<&str>) -> Result<Url> {
        let mut url = self.join(&format!("{}/{}", self.rank_path, contest_id))?;
        if let Some(password) = password {
            url.query_pairs_mut().append_pair("password", password);
        }
        Ok(url)
    }

    /// Human facing contest page the browser navigates to.
    pub fn contest_page_url(&self, contest_id: &ContestId) -> Result<Url> {
        self.join(&format!("{}/{}", self.contest_page_path, contest_id))
    }

    pub fn cookie_domain(&self) -> Option<&str> {
        self.base_url.host_str()
    }

    pub fn is_challenge_title(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.challenge_titles
            .iter()
            .any(|signature| title.contains(&signature.to_lowercase()))
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Could not parse url path: {}", path))
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            // parsing static url will never fail
            base_url: Url::parse("https://vjudge.net").unwrap(),
            contest_data_path: "/contest/data".to_owned(),
            rank_path: "/contest/rank/single".to_owned(),
            contest_page_path: "/contest".to_owned(),
            loaded_selector: "#contest-main".to_owned(),
            challenge_titles: vec![
                "Just a moment...".to_owned(),
                "Attention Required!".to_owned(),
                "DDoS-Guard".to_owned(),
            ],
        }
    }
}
