#![warn(clippy::all)]

use std::io::{self, Write as _};
use std::path::PathBuf;

use anyhow::{anyhow, Context as _};
use structopt::StructOpt;
use strum::{EnumString, IntoStaticStr, VariantNames};

pub mod cache;
mod cmd;
pub mod http;
pub mod service;

use cmd::{Cmd, Run as _};

pub use cpcache_config::Config;
pub use cpcache_util::console::ConsoleConfig;
pub use cpcache_util::Console;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(about, rename_all = "kebab")]
pub struct Opt {
    #[structopt(flatten)]
    global_opt: GlobalOpt,
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalOpt {
    /// Path to config file, searched from the current directory upwards by default
    #[structopt(long, global = true, env = "CPCACHE_CONFIG", parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(
        long,
        global = true,
        default_value = OutputFormat::Default.into(),
        possible_values = &OutputFormat::VARIANTS,
    )]
    format: OutputFormat,
    /// Assumes "yes" for every confirmation
    #[structopt(long, short = "y", global = true)]
    assume_yes: bool,
    /// Shows debug logs
    #[structopt(long, global = true)]
    debug: bool,
}

impl GlobalOpt {
    pub fn load_config(&self, cnsl: &mut Console) -> Result<Config> {
        Config::load(self.config.as_deref(), cnsl).context("Could not load config")
    }
}

#[derive(
    EnumString, IntoStaticStr, VariantNames, Debug, Copy, Clone, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    Default,
    Debug,
    Json,
    Yaml,
}

impl Opt {
    pub fn is_debug(&self) -> bool {
        self.global_opt.debug
    }

    pub fn console_config(&self) -> ConsoleConfig {
        ConsoleConfig {
            assume_yes: self.global_opt.assume_yes,
        }
    }

    pub async fn run(&self, cnsl: &mut Console) -> Result<()> {
        let outcome = self.cmd.run(&self.global_opt, cnsl).await?;
        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        outcome.print(&mut stdout, self.global_opt.format)?;
        stdout.flush()?;
        if outcome.is_error() {
            Err(anyhow!("Command finished with error"))
        } else {
            Ok(())
        }
    }
}
