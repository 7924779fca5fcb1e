//! Storage of daily rasters in a database.

pub mod postgis;
pub mod sqlite;

use std::path::Path;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::table::TableRef;

pub use postgis::PostgisStore;
pub use sqlite::SqliteStore;

/// The database operations the pipeline depends on.
#[async_trait]
pub trait RasterStore: Send + Sync {
    async fn table_exists(&self, table: &TableRef) -> Result<bool>;

    /// Latest `fdate` in the table, `None` when it holds no rows.
    async fn last_date(&self, table: &TableRef) -> Result<Option<NaiveDate>>;

    /// Loads the raster file into `table`, tagged with `date`. Any row already
    /// stored for that date is replaced.
    async fn ingest(&self, raster: &Path, date: NaiveDate, table: &TableRef) -> Result<()>;
}

/// Opens the store matching the URL scheme.
pub async fn connect(database_url: &str) -> Result<Box<dyn RasterStore>> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok(Box::new(PostgisStore::connect(database_url).await?))
    } else if database_url.starts_with("sqlite:") {
        Ok(Box::new(SqliteStore::connect(database_url).await?))
    } else {
        bail!("Unsupported database URL `{}`", database_url)
    }
}
