use std::{fmt, io};

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Serialize;
use structopt::StructOpt;

use crate::{Console, GlobalOpt, OutputFormat, Result};

mod contest;
mod init;
mod serve;
mod show;

pub use contest::{ContestOpt, StandingsOpt};
pub use init::{InitOpt, InitOutcome};
pub use serve::{ServeOpt, ServeOutcome};
pub use show::ShowOpt;

pub trait Outcome: OutcomeSerialize + Send {
    fn is_error(&self) -> bool;
}

pub trait OutcomeSerialize: fmt::Display + fmt::Debug {
    fn write_json(&self, writer: &mut dyn io::Write) -> Result<()>;

    fn write_yaml(&self, writer: &mut dyn io::Write) -> Result<()>;

    fn print(&self, stdout: &mut dyn io::Write, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Default => writeln!(stdout, "{}", self)?,
            OutputFormat::Debug => writeln!(stdout, "{:#?}", self)?,
            OutputFormat::Json => {
                self.write_json(stdout)?;
                writeln!(stdout)?
            }
            OutputFormat::Yaml => self.write_yaml(stdout)?,
        }
        Ok(())
    }
}

impl<T: Serialize + fmt::Display + fmt::Debug> OutcomeSerialize for T {
    fn write_json(&self, writer: &mut dyn io::Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).context("Could not print outcome as json")
    }

    fn write_yaml(&self, writer: &mut dyn io::Write) -> Result<()> {
        serde_yaml::to_writer(writer, self).context("Could not print outcome as yaml")
    }
}

#[async_trait]
pub trait Run {
    async fn run(&self, global_opt: &GlobalOpt, cnsl: &mut Console) -> Result<Box<dyn Outcome>>;
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub enum Cmd {
    /// Creates config file
    Init(InitOpt),
    /// Shows current config
    Show(ShowOpt),
    /// Serves cached contest data over http
    Serve(ServeOpt),
    /// Fetches contest metadata once, without cache
    Contest(ContestOpt),
    /// Fetches standings once, without cache
    Standings(StandingsOpt),
}

#[async_trait]
impl Run for Cmd {
    async fn run(&self, global_opt: &GlobalOpt, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        match self {
            Self::Init(opt) => opt.run(global_opt, cnsl).await,
            Self::Show(opt) => opt.run(global_opt, cnsl).await,
            Self::Serve(opt) => opt.run(global_opt, cnsl).await,
            Self::Contest(opt) => opt.run(global_opt, cnsl).await,
            Self::Standings(opt) => opt.run(global_opt, cnsl).await,
        }
    }
}
