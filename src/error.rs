//! Typed errors for the download pipeline.

use reqwest::StatusCode;
use thiserror::Error;

use crate::subset::BoundingBox;

/// Problems with the run configuration. These abort the run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed table reference `{0}`: expected `schema.table`")]
    MalformedTable(String),

    #[error("Invalid SQL identifier `{0}` in table reference")]
    InvalidIdentifier(String),

    #[error("Invalid bounding box `{0}`: expected `minlon,minlat,maxlon,maxlat`")]
    InvalidBoundingBox(String),

    #[error("Invalid source URL for {variable}: {reason}")]
    InvalidSource { variable: String, reason: String },

    #[error("Could not determine a data directory; pass --data-dir")]
    MissingDataDir,
}

/// Failures of the spatial subsetting step.
#[derive(Error, Debug, PartialEq)]
pub enum SubsetError {
    #[error("Bounding box {0} lies outside the available coordinates")]
    OutOfBounds(BoundingBox),

    #[error("Coordinate axis is empty")]
    EmptyAxis,
}

/// Failures talking to the remote array service.
#[derive(Error, Debug)]
pub enum DapError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("Variable `{0}` not found in response")]
    MissingVariable(String),

    #[error("Attribute `{attribute}` not found for `{variable}`")]
    MissingAttribute { variable: String, attribute: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Unsupported time units `{0}`")]
    TimeUnits(String),
}
