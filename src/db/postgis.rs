//! PostGIS raster store.
//!
//! Rasters are decoded server side with `ST_FromGDALRaster`, which needs the
//! `postgis_raster` extension and the GTiff driver enabled through
//! `postgis.gdal_enabled_drivers`.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;

use super::RasterStore;
use crate::table::TableRef;

pub struct PostgisStore {
    pool: PgPool,
}

impl PostgisStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .context("Connecting to PostGIS")?;

        Ok(PostgisStore { pool })
    }
}

#[async_trait]
impl RasterStore for PostgisStore {
    async fn table_exists(&self, table: &TableRef) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = $1 AND table_name = $2)",
        )
        .bind(&table.schema)
        .bind(&table.table)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn last_date(&self, table: &TableRef) -> Result<Option<NaiveDate>> {
        let last: Option<NaiveDate> =
            sqlx::query_scalar(&format!("SELECT max(fdate) FROM {}", table))
                .fetch_one(&self.pool)
                .await?;

        Ok(last)
    }

    async fn ingest(&self, raster: &Path, date: NaiveDate, table: &TableRef) -> Result<()> {
        let bytes = tokio::fs::read(raster)
            .await
            .with_context(|| format!("Reading {}", raster.display()))?;

        let mut transaction = self.pool.begin().await?;

        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", table.schema))
            .execute(&mut *transaction)
            .await?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                rid SERIAL PRIMARY KEY,
                fdate DATE NOT NULL,
                rast RASTER NOT NULL)"
        ))
        .execute(&mut *transaction)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {}_dtidx ON {table} (fdate)",
            table.table
        ))
        .execute(&mut *transaction)
        .await?;

        let replaced = sqlx::query(&format!("DELETE FROM {table} WHERE fdate = $1"))
            .bind(date)
            .execute(&mut *transaction)
            .await?
            .rows_affected();

        sqlx::query(&format!(
            "INSERT INTO {table} (fdate, rast) VALUES ($1, ST_FromGDALRaster($2))"
        ))
        .bind(date)
        .bind(bytes)
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;

        debug!(%table, %date, replaced, "raster stored");

        Ok(())
    }
}

// -- Tests -------------------------------------------------------------------
