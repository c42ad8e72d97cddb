#![warn(clippy::all)]

use std::io::{self, Write as _};

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use cpcache::{Console, Opt, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();
    init_tracing(opt.is_debug());
    let mut cnsl = Console::term(opt.console_config());
    opt.run(&mut cnsl).await.map_err(|err| {
        io::stdout().flush().unwrap_or(());
        eprintln!();
        err
    })
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cpcache={0},cpcache_origin={0},cpcache_config={0},cpcache_util={0},tower_http={0}",
            level
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
