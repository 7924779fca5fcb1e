//! In-memory raster with coordinate metadata.

use anyhow::{ensure, Result};

/// Row-major `bands x rows x cols` values with latitude (descending) and
/// longitude (ascending) node coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub res: f64,
    pub bands: usize,
    pub values: Vec<f32>,
}

impl Grid {
    /// Single-band grid.
    pub fn new(lat: Vec<f64>, lon: Vec<f64>, res: f64, values: Vec<f32>) -> Result<Self> {
        Grid::with_bands(lat, lon, res, 1, values)
    }

    pub fn with_bands(
        lat: Vec<f64>,
        lon: Vec<f64>,
        res: f64,
        bands: usize,
        values: Vec<f32>,
    ) -> Result<Self> {
        ensure!(bands > 0, "Grid needs at least one band");
        ensure!(
            values.len() == bands * lat.len() * lon.len(),
            "Grid of {} x {} x {} cannot hold {} values",
            bands,
            lat.len(),
            lon.len(),
            values.len()
        );

        Ok(Grid {
            lat,
            lon,
            res,
            bands,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.lat.len()
    }

    pub fn cols(&self) -> usize {
        self.lon.len()
    }

    /// Value of the first band at `(row, col)`.
    #[cfg(test)]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.cols() + col]
    }

    /// Drops every band but the first.
    pub fn first_band(mut self) -> Self {
        if self.bands > 1 {
            self.values.truncate(self.rows() * self.cols());
            self.bands = 1;
        }
        self
    }
}

// -- Tests -------------------------------------------------------------------
