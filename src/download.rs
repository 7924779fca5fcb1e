//! Downloads the missing days of each variable and loads them into the
//! database, one variable and one date at a time.

use anyhow::Result;
use chrono::NaiveDate;
use indicatif::ProgressBar;
use tracing::warn;

use crate::{
    config::Config,
    dap::ArrayService,
    dates::DateRange,
    db::RasterStore,
    fetch::{Fetched, Fetcher},
    ingest::{ingest, IngestOutcome},
    subset::BoundingBox,
    variables::{Registry, Variable},
};

/// What a run did, counted per (variable, date).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub imported: usize,
    pub no_data: usize,
    pub skipped: usize,
}

pub struct Downloader<'a> {
    pub store: &'a dyn RasterStore,
    pub service: &'a dyn ArrayService,
    pub registry: &'a Registry,
    pub config: &'a Config,
}

impl<'a> Downloader<'a> {
    /// Fetches and ingests every date of `range` for each of `variables`.
    /// The first remote or database failure ends the run.
    pub async fn download(
        &self,
        variables: &[Variable],
        range: DateRange,
        bbox: Option<BoundingBox>,
        progress_bar: &ProgressBar,
    ) -> Result<Summary> {
        let fetcher = Fetcher::new(self.service, self.registry, bbox);
        let mut summary = Summary::default();

        progress_bar.set_length((variables.len() * range.num_days()) as u64);

        for &variable in variables {
            for date in range.days() {
                progress_bar.set_message(format!("{} {}", variable, date));
                self.download_variable(&fetcher, variable, date, &mut summary)
                    .await?;
                progress_bar.inc(1);
            }
        }

        Ok(summary)
    }

    async fn download_variable(
        &self,
        fetcher: &Fetcher<'_>,
        variable: Variable,
        date: NaiveDate,
        summary: &mut Summary,
    ) -> Result<()> {
        let table = variable.table();

        let outcome = match fetcher.fetch(variable, date).await? {
            Fetched::Ready { grid, observed } => {
                ingest(self.store, self.config, &table, Some(grid), observed).await?
            }
            Fetched::Unavailable => ingest(self.store, self.config, &table, None, date).await?,
            Fetched::Partial { missing } => {
                warn!(
                    %table,
                    %date,
                    "Skipping date: no data for component(s) {}",
                    missing.join(", ")
                );
                summary.skipped += 1;
                return Ok(());
            }
            Fetched::Misaligned { steps } => {
                let steps: Vec<String> = steps
                    .iter()
                    .map(|(field, observed)| format!("{} at {}", field, observed))
                    .collect();
                warn!(
                    %table,
                    %date,
                    "Skipping date: components on different time steps ({})",
                    steps.join(", ")
                );
                summary.skipped += 1;
                return Ok(());
            }
        };

        match outcome {
            IngestOutcome::Imported => summary.imported += 1,
            IngestOutcome::NoData => summary.no_data += 1,
        }

        Ok(())
    }
}

// -- Tests -------------------------------------------------------------------
