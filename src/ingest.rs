//! Generic path from an in-memory grid to a dated row in a raster table.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::{config::Config, db::RasterStore, grid::Grid, raster::write_geotiff, table::TableRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Imported,
    NoData,
}

/// Writes `grid` as a raster under the table's directory, loads it into
/// `table` tagged with `date`, and removes the raster again.
///
/// A missing grid is not an error: it is reported and nothing is written.
/// Only the first band of a multi-band grid is stored.
pub async fn ingest(
    store: &dyn RasterStore,
    config: &Config,
    table: &TableRef,
    grid: Option<Grid>,
    date: NaiveDate,
) -> Result<IngestOutcome> {
    let Some(grid) = grid else {
        warn!(%table, %date, "No data were available to import");
        return Ok(IngestOutcome::NoData);
    };
    let grid = grid.first_band();

    let dir = config.table_dir(table);
    fs::create_dir_all(&dir).with_context(|| format!("Creating {}", dir.display()))?;

    let raster = TempRaster(raster_path(&dir, table, date));
    write_geotiff(&grid, raster.path())?;
    store
        .ingest(raster.path(), date, table)
        .await
        .with_context(|| format!("Ingesting {} into {}", raster.path().display(), table))?;

    info!("Imported {} in {}", date.format("%Y-%m-%d"), table);

    Ok(IngestOutcome::Imported)
}

/// `<dir>/<table>_<YYYYMMDD>.tif`
pub fn raster_path(dir: &Path, table: &TableRef, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}_{}.tif", table.table, date.format("%Y%m%d")))
}

// Removes the raster once ingest returns, whether it succeeded or not.
struct TempRaster(PathBuf);

impl TempRaster {
    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempRaster {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.0) {
            debug!(path = %self.0.display(), "could not remove raster: {}", e);
        }
    }
}

// -- Tests -------------------------------------------------------------------
