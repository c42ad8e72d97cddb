use std::io::Write as _;

use anyhow::Context as _;
use async_trait::async_trait;
use structopt::StructOpt;

use cpcache_util::console::sty_dim;
use cpcache_util::model::{ContestSnapshot, StandingsSnapshot};

use crate::cmd::{Outcome, Run};
use crate::service::ContestService;
use crate::{Console, GlobalOpt, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct ContestOpt {}

#[async_trait]
impl Run for ContestOpt {
    async fn run(&self, global_opt: &GlobalOpt, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let conf = global_opt.load_config(cnsl)?;
        let svc = ContestService::from_config(&conf)?;
        writeln!(cnsl, "{}", sty_dim("Fetching contest ..."))?;
        let contest = svc
            .acquire_contest()
            .await
            .context("Could not fetch contest")?;
        Ok(Box::new(contest))
    }
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct StandingsOpt {}

#[async_trait]
impl Run for StandingsOpt {
    async fn run(&self, global_opt: &GlobalOpt, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let conf = global_opt.load_config(cnsl)?;
        let svc = ContestService::from_config(&conf)?;
        writeln!(cnsl, "{}", sty_dim("Fetching standings ..."))?;
        let standings = svc
            .acquire_standings()
            .await
            .context("Could not fetch standings")?;
        Ok(Box::new(standings))
    }
}

impl Outcome for ContestSnapshot {
    fn is_error(&self) -> bool {
        false
    }
}

impl Outcome for StandingsSnapshot {
    fn is_error(&self) -> bool {
        false
    }
}
