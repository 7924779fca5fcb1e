//! Bounding boxes and the mapping from a box to grid index ranges.

use std::{fmt, str::FromStr};

use crate::error::{ConfigError, SubsetError};

/// Geographic rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, ConfigError> {
        if min_lon > max_lon || min_lat > max_lat {
            return Err(ConfigError::InvalidBoundingBox(format!(
                "{},{},{},{}",
                min_lon, min_lat, max_lon, max_lat
            )));
        }

        Ok(BoundingBox {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }
}

/// Parses `minlon,minlat,maxlon,maxlat`.
impl FromStr for BoundingBox {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ConfigError::InvalidBoundingBox(s.to_string()))?;

        match parts[..] {
            [min_lon, min_lat, max_lon, max_lat] => {
                BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
            }
            _ => Err(ConfigError::InvalidBoundingBox(s.to_string())),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Half-open index ranges `lat[i1..i2]`, `lon[j1..j2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subset {
    pub i1: usize,
    pub i2: usize,
    pub j1: usize,
    pub j2: usize,
}

/// Computes the index ranges covering `bbox` on a grid with descending
/// latitude and ascending longitude.
///
/// Each cell is treated as extending `res / 2` around its node, and the
/// enclosing cells on every edge are kept, so the subgrid always contains the
/// whole box. Without a box the full extent of both axes is returned.
pub fn spatial_subset(
    lat: &[f64],
    lon: &[f64],
    res: f64,
    bbox: Option<&BoundingBox>,
) -> Result<Subset, SubsetError> {
    if lat.is_empty() || lon.is_empty() {
        return Err(SubsetError::EmptyAxis);
    }

    let Some(bbox) = bbox else {
        return Ok(Subset {
            i1: 0,
            i2: lat.len(),
            j1: 0,
            j2: lon.len(),
        });
    };

    let half = res / 2.0;
    let out_of_bounds = || SubsetError::OutOfBounds(*bbox);

    let i1 = lat
        .iter()
        .rposition(|&y| y + half >= bbox.max_lat)
        .ok_or_else(out_of_bounds)?;
    let i2 = lat
        .iter()
        .position(|&y| y - half <= bbox.min_lat)
        .ok_or_else(out_of_bounds)?;
    let j1 = lon
        .iter()
        .rposition(|&x| x - half <= bbox.min_lon)
        .ok_or_else(out_of_bounds)?;
    let j2 = lon
        .iter()
        .position(|&x| x + half >= bbox.max_lon)
        .ok_or_else(out_of_bounds)?;

    // A box narrower than a cell that sits on the edge shared by two cells
    // matches both from opposite sides. Every cell from the second index to
    // the first encloses it; keep the north-west one.
    let i1 = i1.min(i2);
    let j1 = j1.min(j2);

    Ok(Subset {
        i1,
        i2: i2 + 1,
        j1,
        j2: j2 + 1,
    })
}

// -- Tests -------------------------------------------------------------------
