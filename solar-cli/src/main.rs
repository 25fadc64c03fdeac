use std::io;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, warn};

use solar_cli::logging::{
    DEFAULT_LOG_LEVEL, enable_file_logging, env_filter_present, init_logging, set_log_level,
};
use solar_cli::{AppConfig, Cli, Session, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(DEFAULT_LOG_LEVEL);

    let cli = Cli::parse();
    let overrides = cli.overrides();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(overrides);

    if !env_filter_present() {
        if let Err(err) = set_log_level(&config.log_level) {
            warn!("{err:#}; keeping level {DEFAULT_LOG_LEVEL}");
        }
    }
    if let Some(path) = &config.log_file {
        enable_file_logging(path)?;
    }

    debug!("connecting to {} backend", config.database.backend);
    let repo = app::open_repository(&config.database)
        .await
        .with_context(|| format!("cannot open database '{}'", config.database.connection_string))?;

    let session = Session::new(repo.as_ref(), &config.defaults);
    session
        .execute(cli.command, Utc::now(), &mut io::stdout().lock())
        .await?;

    Ok(())
}
