use std::env;
use std::fmt;
use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use serde::Serialize;
use structopt::StructOpt;

use cpcache_config::ConfigBody;
use cpcache_util::console::sty_g;

use crate::cmd::{Outcome, Run};
use crate::{Console, GlobalOpt, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct InitOpt {
    /// Directory to create the config file in, current directory by default
    base_dir: Option<PathBuf>,
    #[structopt(long, short = "w")]
    overwrite: bool,
}

impl InitOpt {
    fn save(&self, cnsl: &mut Console) -> Result<InitOutcome> {
        let cwd = env::current_dir().context("Could not get current directory")?;
        let base_dir = match &self.base_dir {
            Some(path) => cwd.join(path),
            None => cwd,
        };

        if !base_dir.is_dir() {
            return Err(anyhow!("Could not find directory : {}", base_dir.display()));
        }

        let config_path = base_dir.join(ConfigBody::FILE_NAME);
        if config_path.exists() && !self.overwrite {
            let message = format!("Overwrite {} ?", config_path.display());
            if !cnsl.confirm(&message, false)? {
                return Err(anyhow!(
                    "Config file already exists : {}",
                    config_path.display()
                ));
            }
        }

        let mut file = File::create(&config_path)
            .with_context(|| format!("Could not create {}", config_path.display()))?;
        ConfigBody::generate_to(&mut file).context("Could not save config")?;
        file.flush()?;
        writeln!(cnsl, "{} {}", sty_g("Saved"), config_path.display())?;

        Ok(InitOutcome { config_path })
    }
}

#[async_trait]
impl Run for InitOpt {
    async fn run(&self, _global_opt: &GlobalOpt, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        Ok(Box::new(self.save(cnsl)?))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct InitOutcome {
    config_path: PathBuf,
}

impl fmt::Display for InitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Saved config file : {}", self.config_path.display())
    }
}

impl Outcome for InitOutcome {
    fn is_error(&self) -> bool {
        false
    }
}
