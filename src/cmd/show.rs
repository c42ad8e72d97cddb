use async_trait::async_trait;
use structopt::StructOpt;

use crate::cmd::{Outcome, Run};
use crate::{Config, Console, GlobalOpt, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct ShowOpt {}

#[async_trait]
impl Run for ShowOpt {
    async fn run(&self, global_opt: &GlobalOpt, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let conf = global_opt.load_config(cnsl)?;
        Ok(Box::new(conf))
    }
}

impl Outcome for Config {
    fn is_error(&self) -> bool {
        false
    }
}
