use std::collections::HashSet;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use indicatif::MultiProgress;
use tracing::info;

use crate::{
    cli::{create_progress_bar, create_spinner},
    config::Config,
    dap::DapClient,
    dates::resolve_range,
    db,
    download::{Downloader, Summary},
    subset::BoundingBox,
    variables::{Registry, Variable},
};

pub async fn download(
    config: &Config,
    progress: &MultiProgress,
    bbox: Option<BoundingBox>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    variables: &[Variable],
) -> Result<Summary> {
    let registry = Registry::new(&config.server)?;
    let store = db::connect(&config.database_url).await?;
    let variables = select_variables(variables);

    let today = Local::now().date_naive();
    let resume = registry.resume_table();
    let spinner = create_spinner(progress, format!("Checking {}...", resume));
    let range = resolve_range(store.as_ref(), &resume, start, end, today).await?;
    spinner.finish_and_clear();

    let Some(range) = range else {
        return Ok(Summary::default());
    };
    info!("Downloading {} to {}", range.start, range.end);

    let service = DapClient::new();
    let downloader = Downloader {
        store: store.as_ref(),
        service: &service,
        registry: &registry,
        config,
    };

    let bar = create_progress_bar(progress, 0, "Downloading...".to_string());
    let summary = downloader.download(&variables, range, bbox, &bar).await?;
    bar.finish_with_message("Download complete");

    Ok(summary)
}

// Registry order, all variables when none are named.
fn select_variables(requested: &[Variable]) -> Vec<Variable> {
    if requested.is_empty() {
        return Variable::ALL.to_vec();
    }
    let requested: HashSet<_> = requested.iter().collect();
    Variable::ALL
        .into_iter()
        .filter(|v| requested.contains(v))
        .collect()
}
