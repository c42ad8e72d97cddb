#![warn(clippy::all)]

use async_trait::async_trait;

use cpcache_config as config;
use cpcache_util::model::{CredentialContext, StandingsSnapshot};
use cpcache_util::{model, FetchError};

pub mod browser;
mod direct;
mod fallback;
mod outcome;
mod request;
mod session;
pub mod validate;

pub use direct::DirectAcquirer;
pub use fallback::BrowserAcquirer;
pub use outcome::Outcome;
pub use validate::ContestMeta;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

/// One strategy for pulling data from the origin.
///
/// Implementations issue a single attempt per call and never retry; the
/// caller decides whether to escalate to another strategy.
#[async_trait]
pub trait Acquire: Send + Sync {
    async fn fetch_contest_meta(&self, ctx: &CredentialContext) -> Outcome<ContestMeta>;

    async fn fetch_standings(&self, ctx: &CredentialContext) -> Outcome<StandingsSnapshot>;
}
