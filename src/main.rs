mod cftime;
mod cli;
mod config;
mod dap;
mod dates;
mod db;
mod download;
mod error;
mod fetch;
mod grid;
mod ingest;
mod raster;
mod subset;
mod table;
#[cfg(test)]
mod testing;
mod variables;

use anyhow::Result;
use clap::Parser;
use cli::{command, Cli, Commands, LogWriter};
use config::Config;
use indicatif::MultiProgress;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = MultiProgress::new();
    let log_progress = progress.clone();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.global.log_level)
        .with_writer(move || LogWriter(log_progress.clone()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::new(
        cli.global.data_dir,
        cli.global.database_url,
        cli.global.server,
    )?;

    match cli.command {
        Commands::Download {
            bbox,
            start,
            end,
            variables,
        } => {
            let summary =
                command::download(&config, &progress, bbox, start, end, &variables).await?;
            println!(
                "{} imported, {} without data, {} skipped",
                summary.imported, summary.no_data, summary.skipped
            );
        }
        Commands::Dates {} => match command::dates(&config).await? {
            Some(range) => println!("{} to {}", range.start, range.end),
            None => println!("Nothing to download"),
        },
    }

    Ok(())
}
