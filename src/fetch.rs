//! Retrieves one daily time slice of a variable from the remote service.

use std::{collections::HashMap, sync::Arc};

use anyhow::{ensure, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    cftime,
    dap::{ArrayService, Span},
    grid::Grid,
    subset::{spatial_subset, BoundingBox},
    variables::{Registry, Source, Variable, RESOLUTION},
};

/// Result of fetching a variable for one date.
#[derive(Debug)]
pub enum Fetched {
    /// `observed` is the date of the time step actually used, the first one
    /// on or after the requested date.
    Ready { grid: Grid, observed: NaiveDate },
    /// No source has a time step on or after the requested date.
    Unavailable,
    /// Some components of a multi-source variable have no matching time
    /// step. The date is skipped rather than ingested with partial data.
    Partial { missing: Vec<&'static str> },
    /// The components matched different time steps, listed per field. They
    /// are not combined and the date is skipped.
    Misaligned { steps: Vec<(&'static str, NaiveDate)> },
}

struct Slice {
    field: &'static str,
    lat: Vec<f64>,
    lon: Vec<f64>,
    values: Vec<f32>,
    observed: NaiveDate,
}

/// Coordinates and time axis of one source, restricted to the bounding box.
struct Axes {
    /// Source row and column indices of the subset, north to south and west
    /// to east.
    rows: Vec<usize>,
    cols: Vec<usize>,
    lat: Vec<f64>,
    lon: Vec<f64>,
    times: Vec<NaiveDateTime>,
}

pub struct Fetcher<'a> {
    service: &'a dyn ArrayService,
    registry: &'a Registry,
    bbox: Option<BoundingBox>,
    // Axes are read once per source URL for the lifetime of the fetcher.
    axes: Mutex<HashMap<String, Arc<Axes>>>,
}

impl<'a> Fetcher<'a> {
    pub fn new(
        service: &'a dyn ArrayService,
        registry: &'a Registry,
        bbox: Option<BoundingBox>,
    ) -> Self {
        Fetcher {
            service,
            registry,
            bbox,
            axes: Mutex::new(HashMap::new()),
        }
    }

    pub async fn fetch(&self, variable: Variable, date: NaiveDate) -> Result<Fetched> {
        let entry = self.registry.entry(variable);

        let mut slices = Vec::with_capacity(entry.sources.len());
        let mut missing = Vec::new();
        for source in &entry.sources {
            match self.fetch_source(source, date).await? {
                Some(slice) => slices.push(slice),
                None => missing.push(source.field),
            }
        }

        let Some(first) = slices.first() else {
            return Ok(Fetched::Unavailable);
        };
        if !missing.is_empty() {
            return Ok(Fetched::Partial { missing });
        }
        if slices.iter().any(|s| s.observed != first.observed) {
            return Ok(Fetched::Misaligned {
                steps: slices.iter().map(|s| (s.field, s.observed)).collect(),
            });
        }

        ensure!(
            slices
                .iter()
                .all(|s| s.lat == first.lat && s.lon == first.lon),
            "Components of {} are on different grids",
            variable
        );

        let lat = first.lat.clone();
        let lon = first.lon.clone();
        let observed = first.observed;

        let mut values = entry
            .combine
            .apply(slices.into_iter().map(|s| s.values).collect());
        entry.conversion.apply(&mut values);

        Ok(Fetched::Ready {
            grid: Grid::new(lat, lon, RESOLUTION, values)?,
            observed,
        })
    }

    async fn fetch_source(&self, source: &Source, date: NaiveDate) -> Result<Option<Slice>> {
        let url = source.url.as_str();
        let axes = self.axes(url).await?;

        let Some(ti) = axes.times.iter().position(|t| t.date() >= date) else {
            debug!(url, %date, "no time step on or after date");
            return Ok(None);
        };

        let y = covering_span(&axes.rows);
        let x = covering_span(&axes.cols);

        // Dimensions are (T, level, Y, X); level 0 is the only one.
        let slab = [Span::at(ti), Span::at(0), y, x];
        let window = self
            .service
            .read_array(url, source.field, Some(&slab[..]))
            .await?;
        ensure!(
            window.len() == y.size() * x.size(),
            "Expected {} values of {} from {}, got {}",
            y.size() * x.size(),
            source.field,
            url,
            window.len()
        );

        let values = axes
            .rows
            .iter()
            .flat_map(|&r| {
                let window = &window;
                axes.cols
                    .iter()
                    .map(move |&c| window[(r - y.start) * x.size() + (c - x.start)] as f32)
            })
            .collect();

        debug!(url, field = source.field, time = %axes.times[ti], "fetched slice");

        Ok(Some(Slice {
            field: source.field,
            lat: axes.lat.clone(),
            lon: axes.lon.clone(),
            values,
            observed: axes.times[ti].date(),
        }))
    }

    async fn axes(&self, url: &str) -> Result<Arc<Axes>> {
        let mut cache = self.axes.lock().await;
        if let Some(axes) = cache.get(url) {
            return Ok(Arc::clone(axes));
        }

        let axes = Arc::new(self.read_axes(url).await?);
        cache.insert(url.to_string(), Arc::clone(&axes));

        Ok(axes)
    }

    async fn read_axes(&self, url: &str) -> Result<Axes> {
        let lat = self.service.read_array(url, "Y", None).await?;
        let mut lon = self.service.read_array(url, "X", None).await?;
        lon.iter_mut().filter(|x| **x > 180.0).for_each(|x| *x -= 360.0);

        // Positions of the source's nodes once latitude runs north to south
        // and longitude west to east.
        let mut lat_order: Vec<usize> = (0..lat.len()).collect();
        lat_order.sort_by(|&a, &b| lat[b].total_cmp(&lat[a]));
        let mut lon_order: Vec<usize> = (0..lon.len()).collect();
        lon_order.sort_by(|&a, &b| lon[a].total_cmp(&lon[b]));

        let sorted_lat: Vec<f64> = lat_order.iter().map(|&i| lat[i]).collect();
        let sorted_lon: Vec<f64> = lon_order.iter().map(|&j| lon[j]).collect();
        let subset = spatial_subset(&sorted_lat, &sorted_lon, RESOLUTION, self.bbox.as_ref())?;

        let units = self.service.read_attribute(url, "T", "units").await?;
        let offsets = self.service.read_array(url, "T", None).await?;
        let times = cftime::decode(&units, &offsets)?;

        debug!(url, steps = times.len(), "read axes");

        Ok(Axes {
            rows: lat_order[subset.i1..subset.i2].to_vec(),
            cols: lon_order[subset.j1..subset.j2].to_vec(),
            lat: sorted_lat[subset.i1..subset.i2].to_vec(),
            lon: sorted_lon[subset.j1..subset.j2].to_vec(),
            times,
        })
    }
}

// Smallest contiguous window of source indices containing all of `indices`.
// Longitude subsets that straddle the 180 degree seam map to both ends of the
// source axis, so the window then spans the whole axis.
fn covering_span(indices: &[usize]) -> Span {
    let start = indices.iter().copied().min().unwrap_or(0);
    let stop = indices.iter().copied().max().unwrap_or(0);
    Span::new(start, stop)
}

// -- Tests -------------------------------------------------------------------
