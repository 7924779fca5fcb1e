use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::{
    config::Config,
    dates::{resolve_range, DateRange},
    db::{self, RasterStore},
    variables::Registry,
};

/// The dates a `download` run without `--start`/`--end` would fetch.
pub async fn dates(config: &Config) -> Result<Option<DateRange>> {
    let registry = Registry::new(&config.server)?;
    let store = db::connect(&config.database_url).await?;
    let today = Local::now().date_naive();

    pending_dates(store.as_ref(), &registry, today).await
}

async fn pending_dates(
    store: &dyn RasterStore,
    registry: &Registry,
    today: NaiveDate,
) -> Result<Option<DateRange>> {
    resolve_range(store, &registry.resume_table(), None, None, today).await
}
