use anyhow::Result;
use clap::Parser;
use keylink_cli::{app, cli::KeylinkCli, config::Settings, logging::init_logging};

#[tokio::main]
pub async fn main() -> Result<()> {
    let cli = KeylinkCli::parse();
    let settings = Settings::resolve(&cli.global)?;
    init_logging(settings.log_format, &settings.log_level)?;

    let mut stdout = std::io::stdout().lock();
    app::run(cli.command, &settings, &mut stdout).await
}
