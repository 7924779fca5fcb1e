//! SQLite raster store for local runs.
//!
//! SQLite has no schemas, so `schema.table` maps to the table
//! `<schema>_<table>` and rasters are kept as GeoTIFF blobs.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};

use super::RasterStore;
use crate::table::TableRef;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        if !database_url.contains(":memory:")
            && !Sqlite::database_exists(database_url)
                .await
                .unwrap_or(false)
        {
            Sqlite::create_database(database_url)
                .await
                .with_context(|| format!("Creating {}", database_url))?;
        }

        // A single connection keeps in-memory databases alive and shared.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;

        Ok(SqliteStore { pool })
    }

    /// All dates stored in `table`, oldest first.
    #[cfg(test)]
    pub async fn dates(&self, table: &TableRef) -> Result<Vec<NaiveDate>> {
        let rows: Vec<String> =
            sqlx::query_scalar(&format!("SELECT fdate FROM {} ORDER BY fdate", table_name(table)))
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(String::as_str).map(parse_date).collect()
    }

    /// Raster stored in `table` for `date`.
    #[cfg(test)]
    pub async fn raster(&self, table: &TableRef, date: NaiveDate) -> Result<Vec<u8>> {
        let bytes: Vec<u8> =
            sqlx::query_scalar(&format!("SELECT rast FROM {} WHERE fdate = ?", table_name(table)))
                .bind(date.format("%Y-%m-%d").to_string())
                .fetch_one(&self.pool)
                .await?;

        Ok(bytes)
    }
}

#[async_trait]
impl RasterStore for SqliteStore {
    async fn table_exists(&self, table: &TableRef) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table_name(table))
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    async fn last_date(&self, table: &TableRef) -> Result<Option<NaiveDate>> {
        let last: Option<String> =
            sqlx::query_scalar(&format!("SELECT max(fdate) FROM {}", table_name(table)))
                .fetch_one(&self.pool)
                .await?;

        last.as_deref().map(parse_date).transpose()
    }

    async fn ingest(&self, raster: &Path, date: NaiveDate, table: &TableRef) -> Result<()> {
        let name = table_name(table);
        let bytes = tokio::fs::read(raster)
            .await
            .with_context(|| format!("Reading {}", raster.display()))?;
        let fdate = date.format("%Y-%m-%d").to_string();

        let mut transaction = self.pool.begin().await?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {name} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fdate TEXT NOT NULL,
                rast BLOB NOT NULL)"
        ))
        .execute(&mut *transaction)
        .await?;

        sqlx::query(&format!("DELETE FROM {name} WHERE fdate = ?"))
            .bind(&fdate)
            .execute(&mut *transaction)
            .await?;

        sqlx::query(&format!("INSERT INTO {name} (fdate, rast) VALUES (?, ?)"))
            .bind(&fdate)
            .bind(bytes)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;

        Ok(())
    }
}

fn table_name(table: &TableRef) -> String {
    format!("{}_{}", table.schema, table.table)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Bad fdate `{}`", s))
}

// -- Tests -------------------------------------------------------------------
