use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use airfare_dash::config::Config;
use airfare_dash::server::{self, Site};

fn main() -> Result<()> {
    let config = Config::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let source = config.source();
    let site = match airfare_dash::build(&source).and_then(Site::new) {
        Ok(site) => Arc::new(site),
        Err(err) => {
            error!(%source, %err, "dashboard build failed, not serving");
            return Err(err).context("building dashboard");
        }
    };

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?
        .block_on(server::serve(site, config.bind))
        .context("serving dashboard")
}
