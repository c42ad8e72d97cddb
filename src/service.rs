use std::sync::Arc;

use anyhow::Context as _;
use futures::future::BoxFuture;
use tracing::{info, warn};

use cpcache_config::{Config, SettingsStore};
use cpcache_origin::browser::ChromiumBrowser;
use cpcache_origin::{Acquire, BrowserAcquirer, ContestMeta, DirectAcquirer, Outcome};
use cpcache_util::model::{synthesize, ContestSnapshot, CredentialContext, StandingsSnapshot};
use cpcache_util::{FetchError, Stage, StageFailure};

use crate::cache::{ResourceKind, SnapshotCache};
use crate::Result;

type Fetch<T> = for<'a> fn(&'a dyn Acquire, &'a CredentialContext) -> BoxFuture<'a, Outcome<T>>;

#[derive(Debug)]
enum State<T> {
    TryPrimary,
    TryFallback(StageFailure),
    Accept(T),
    Failed(Vec<StageFailure>),
}

/// Serves contest snapshots, going to the origin only when the cache is
/// stale.
///
/// An acquisition tries the direct strategy once and the browser strategy at
/// most once. Nothing is cached unless one of them succeeds.
pub struct ContestService {
    settings: Arc<dyn SettingsStore>,
    primary: Arc<dyn Acquire>,
    fallback: Arc<dyn Acquire>,
    cache: SnapshotCache,
}

impl ContestService {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        primary: Arc<dyn Acquire>,
        fallback: Arc<dyn Acquire>,
        cache: SnapshotCache,
    ) -> Self {
        Self {
            settings,
            primary,
            fallback,
            cache,
        }
    }

    pub fn from_config(conf: &Config) -> Result<Self> {
        let primary = DirectAcquirer::new(conf.session(), conf.origin().clone())
            .context("Could not create direct acquirer")?;
        let fallback = BrowserAcquirer::new(
            ChromiumBrowser::new(conf.browser().clone()),
            conf.origin().clone(),
            conf.browser().clone(),
        );
        Ok(Self::new(
            Arc::new(conf.settings_store()),
            Arc::new(primary),
            Arc::new(fallback),
            SnapshotCache::new(conf.cache().clone()),
        ))
    }

    pub async fn contest(&self) -> std::result::Result<Arc<ContestSnapshot>, FetchError> {
        self.cache.contest(|| self.acquire_contest()).await
    }

    pub async fn standings(&self) -> std::result::Result<Arc<StandingsSnapshot>, FetchError> {
        self.cache.standings(|| self.acquire_standings()).await
    }

    /// Fetches contest metadata, bypassing the cache.
    pub async fn acquire_contest(&self) -> std::result::Result<ContestSnapshot, FetchError> {
        let settings = self.settings.load()?;
        let ctx = settings.credential()?;
        let ContestMeta { title, problems } = self
            .acquire(ResourceKind::Contest, &ctx, |acquirer, ctx| {
                acquirer.fetch_contest_meta(ctx)
            })
            .await?;
        let problems = match problems {
            Some(problems) => problems,
            None => {
                warn!(
                    "Origin gave no usable problem list, using {} problems from settings",
                    settings.problem_count()
                );
                synthesize(settings.problem_count(), settings.problem_titles().as_deref())?
            }
        };
        Ok(ContestSnapshot::new(
            title,
            problems,
            ctx.contest_id().clone(),
            ctx.contest_password().clone(),
        ))
    }

    /// Fetches standings, bypassing the cache.
    pub async fn acquire_standings(&self) -> std::result::Result<StandingsSnapshot, FetchError> {
        let ctx = self.settings.load()?.credential()?;
        self.acquire(ResourceKind::Standings, &ctx, |acquirer, ctx| {
            acquirer.fetch_standings(ctx)
        })
        .await
    }

    async fn acquire<T>(
        &self,
        kind: ResourceKind,
        ctx: &CredentialContext,
        fetch: Fetch<T>,
    ) -> std::result::Result<T, FetchError> {
        let mut state = State::TryPrimary;
        loop {
            state = match state {
                State::TryPrimary => match fetch(self.primary.as_ref(), ctx).await.into_result() {
                    Ok(value) => State::Accept(value),
                    Err(err) => {
                        warn!("Direct {} request failed ({}), trying browser", kind, err);
                        State::TryFallback(StageFailure::new(Stage::Primary, err))
                    }
                },
                State::TryFallback(primary) => {
                    match fetch(self.fallback.as_ref(), ctx).await.into_result() {
                        Ok(value) => State::Accept(value),
                        Err(err) => {
                            warn!("Browser {} request failed ({})", kind, err);
                            State::Failed(vec![primary, StageFailure::new(Stage::Fallback, err)])
                        }
                    }
                }
                State::Accept(value) => {
                    info!("Acquired {}", kind);
                    return Ok(value);
                }
                State::Failed(failures) => return Err(FetchError::Aggregate(failures)),
            }
        }
    }
}
