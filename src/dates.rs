//! Works out which dates a table is still missing.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use crate::{db::RasterStore, table::TableRef};

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(DateRange { start, end })
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

/// Dates after the last one ingested into `table`, up to `today`.
///
/// Returns `None` when there is nothing to resume from (the table does not
/// exist or is empty) and when the table is already up to date. Callers
/// tell the two apart with `table_exists`.
pub async fn missing_dates(
    store: &dyn RasterStore,
    table: &TableRef,
    today: NaiveDate,
) -> Result<Option<DateRange>> {
    if !store.table_exists(table).await? {
        debug!(%table, "table does not exist");
        return Ok(None);
    }

    let Some(last) = store.last_date(table).await? else {
        debug!(%table, "table is empty");
        return Ok(None);
    };

    if last >= today {
        return Ok(None);
    }

    Ok(last
        .checked_add_days(Days::new(1))
        .and_then(|start| DateRange::new(start, today)))
}

/// First day of the daily reanalysis record.
pub fn first_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1948, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// The dates a download run should cover.
///
/// `start` and `end` override the resumed range. Without a `start`, a run
/// against an absent or empty table begins at [`first_date`]. `None` means
/// there is nothing to do.
pub async fn resolve_range(
    store: &dyn RasterStore,
    table: &TableRef,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Option<DateRange>> {
    let end = end.unwrap_or(today);

    let start = match start {
        Some(start) => start,
        None => match missing_dates(store, table, end).await? {
            Some(range) => range.start,
            None if store.table_exists(table).await?
                && store.last_date(table).await?.is_some() =>
            {
                info!(%table, "Already up to date");
                return Ok(None);
            }
            None => first_date(),
        },
    };

    Ok(DateRange::new(start, end))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::db::SqliteStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn store_with_last_date(last: NaiveDate) -> (SqliteStore, TableRef, TempDir) {
        let tmp_dir = TempDir::new().unwrap();
        let raster = tmp_dir.path().join("ncep.tif");
        fs::write(&raster, b"raster").unwrap();

        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        let table: TableRef = "wind.ncep".parse().unwrap();
        store.ingest(&raster, last, &table).await.unwrap();

        (store, table, tmp_dir)
    }

    #[tokio::test]
    async fn should_resume_after_last_date() {
        let (store, table, _tmp) = store_with_last_date(date(2020, 1, 1)).await;

        let range = missing_dates(&store, &table, date(2020, 1, 3))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(range.start, date(2020, 1, 2));
        assert_eq!(range.end, date(2020, 1, 3));
        assert_eq!(range.num_days(), 2);
    }

    #[tokio::test]
    async fn should_be_none_when_up_to_date() {
        let (store, table, _tmp) = store_with_last_date(date(2020, 1, 3)).await;

        assert_eq!(missing_dates(&store, &table, date(2020, 1, 3)).await.unwrap(), None);
        assert_eq!(missing_dates(&store, &table, date(2020, 1, 2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_be_none_for_missing_table() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        let table: TableRef = "wind.ncep".parse().unwrap();

        assert_eq!(missing_dates(&store, &table, date(2020, 1, 3)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_resolve_overrides_and_defaults() {
        let (store, table, _tmp) = store_with_last_date(date(2020, 1, 1)).await;
        let today = date(2020, 1, 3);

        let resumed = resolve_range(&store, &table, None, None, today).await.unwrap();
        assert_eq!(resumed, DateRange::new(date(2020, 1, 2), today));

        let (start, end) = (date(2019, 12, 31), date(2020, 1, 1));
        let forced = resolve_range(&store, &table, Some(start), Some(end), today)
            .await
            .unwrap();
        assert_eq!(forced, DateRange::new(start, end));

        let up_to_date = resolve_range(&store, &table, None, Some(date(2020, 1, 1)), today)
            .await
            .unwrap();
        assert_eq!(up_to_date, None);

        let absent: TableRef = "tmax.ncep".parse().unwrap();
        let fresh = resolve_range(&store, &absent, None, None, today).await.unwrap();
        assert_eq!(fresh, DateRange::new(first_date(), today));
    }

    #[test]
    fn should_iterate_inclusive_range() {
        let range = DateRange::new(date(2019, 12, 30), date(2020, 1, 2)).unwrap();
        let days: Vec<_> = range.days().collect();

        assert_eq!(days.len(), 4);
        assert_eq!(days[0], date(2019, 12, 30));
        assert_eq!(days[3], date(2020, 1, 2));
        assert!(DateRange::new(date(2020, 1, 2), date(2020, 1, 1)).is_none());
    }
}
