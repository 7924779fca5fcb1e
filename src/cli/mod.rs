//! Command line interface.

pub mod command;

use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use chrono::NaiveDate;
use clap::{command, Args, Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::Level;

use crate::{
    subset::BoundingBox,
    variables::{Variable, IRIDL_SOURCES},
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Database to load rasters into (postgres:// or sqlite:)
    #[arg(long, env = "NCEP_DATABASE_URL", default_value = "sqlite://ncep.sqlite")]
    pub database_url: String,

    /// Directory for temporary rasters [default: <user data dir>/ncep]
    #[arg(long, env = "NCEP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the data library
    #[arg(long, default_value = IRIDL_SOURCES)]
    pub server: String,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: Level,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the missing days and load them into the database
    Download {
        /// Region to keep: min_lon,min_lat,max_lon,max_lat
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<BoundingBox>,

        /// First date to download [default: the day after the last one stored]
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date to download [default: today]
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Variables to download [default: all]
        #[arg(long = "variable", value_enum)]
        variables: Vec<Variable>,
    },
    /// Show the dates a download would fetch
    Dates {},
}

/// Creates a spinner.
pub fn create_spinner(progress: &MultiProgress, message: String) -> ProgressBar {
    let bar = progress.add(ProgressBar::new_spinner().with_message(message));
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(progress: &MultiProgress, size: u64, message: String) -> ProgressBar {
    let bar = ProgressBar::new(size).with_message(message);
    let bar = match ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}") {
        Ok(style) => bar.with_style(style.progress_chars("##-")),
        Err(_) => bar,
    };

    progress.add(bar)
}

/// Log sink that clears the progress bars while a line is written to stderr
/// and redraws them afterwards.
pub struct LogWriter(pub MultiProgress);

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use clap::CommandFactory;
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn should_verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn should_log_around_progress_bars() {
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let bar = create_progress_bar(&progress, 10, "Downloading...".to_string());
        bar.inc(3);
        let mut writer = LogWriter(progress.clone());

        writer.write_all(b"log line\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(bar.position(), 3);
        assert!(!bar.is_finished());
    }

    #[test]
    fn should_parse_download_arguments() {
        let cli = Cli::try_parse_from([
            "ncep",
            "--database-url",
            "sqlite::memory:",
            "download",
            "--bbox",
            "-10,35,5,45",
            "--start",
            "2020-01-02",
            "--variable",
            "wind",
            "--variable",
            "tmax",
        ])
        .unwrap();

        assert_eq!(cli.global.database_url, "sqlite::memory:");
        assert_eq!(cli.global.log_level, Level::INFO);
        match cli.command {
            Commands::Download {
                bbox,
                start,
                end,
                variables,
            } => {
                assert_eq!(bbox, Some(BoundingBox::new(-10.0, 35.0, 5.0, 45.0).unwrap()));
                assert_eq!(start, NaiveDate::from_ymd_opt(2020, 1, 2));
                assert_eq!(end, None);
                assert_eq!(variables, vec![Variable::Wind, Variable::Tmax]);
            }
            Commands::Dates {} => panic!("expected download"),
        }
    }
}
