use std::fmt;
use std::io::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Serialize;
use structopt::StructOpt;

use cpcache_util::console::sty_dim;

use crate::cmd::{Outcome, Run};
use crate::http;
use crate::service::ContestService;
use crate::{Console, GlobalOpt, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct ServeOpt {
    /// Address to listen on, overriding `server.listen` in config
    #[structopt(long)]
    listen: Option<SocketAddr>,
}

#[async_trait]
impl Run for ServeOpt {
    async fn run(&self, global_opt: &GlobalOpt, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let conf = global_opt.load_config(cnsl)?;
        let svc = Arc::new(ContestService::from_config(&conf)?);
        let cors = http::cors(conf.server().allowed_origins())?;
        let listen = self.listen.unwrap_or_else(|| conf.server().listen());

        writeln!(
            cnsl,
            "Serving on {} {}",
            listen,
            sty_dim(format!("(settings: {})", conf.settings_abs_path().display()))
        )?;
        http::serve(listen, svc, cors)
            .await
            .context("Could not serve")?;
        Ok(Box::new(ServeOutcome { listen }))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServeOutcome {
    listen: SocketAddr,
}

impl fmt::Display for ServeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Stopped server on {}", self.listen)
    }
}

impl Outcome for ServeOutcome {
    fn is_error(&self) -> bool {
        false
    }
}
