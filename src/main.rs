use anyhow::Result;
use bisync::{cli, logging};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let _guard = logging::init(&args.command)?;

    if let Err(err) = cli::run(args).await {
        let message = format!("{:#}", err);
        tracing::error!(error = %message, "command failed");
        return Err(err);
    }
    Ok(())
}
