//! Writes grids as single-band GeoTIFF files.
//!
//! Cells are centred on the grid nodes, so the upper-left corner of the
//! image sits half a cell north-west of the first node. This matches the
//! half-cell expansion used when subsetting.

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{ensure, Context, Result};
use tiff::{
    encoder::{colortype::Gray32Float, TiffEncoder},
    tags::Tag,
};

use crate::grid::Grid;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;

// GeoKey directory: header, then (key, location, count, value) entries for
// GTModelType = geographic, GTRasterType = pixel is area, GeographicType =
// WGS84.
const GEO_KEYS: [u16; 16] = [
    1, 1, 0, 3, //
    1024, 0, 1, 2, //
    1025, 0, 1, 1, //
    2048, 0, 1, 4326,
];

/// Writes the first band of `grid` to `path`.
pub fn write_geotiff(grid: &Grid, path: &Path) -> Result<()> {
    ensure!(
        grid.rows() > 0 && grid.cols() > 0,
        "Cannot write an empty grid to {}",
        path.display()
    );

    let file = File::create(path).with_context(|| format!("Creating {}", path.display()))?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    let mut image = encoder.new_image::<Gray32Float>(grid.cols() as u32, grid.rows() as u32)?;

    let half = grid.res / 2.0;
    let scale = [grid.res, grid.res, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, grid.lon[0] - half, grid.lat[0] + half, 0.0];

    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])?;
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])?;
    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &GEO_KEYS[..])?;

    image.write_data(&grid.values[..grid.rows() * grid.cols()])?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
