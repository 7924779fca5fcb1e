//! Client for gridded-data servers speaking DAP2 (OPeNDAP) over HTTP.

pub mod ascii;
pub mod das;

use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::error::DapError;

/// Inclusive index range along one dimension, written `[start:stop]` in a
/// DAP constraint expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub stop: usize,
}

impl Span {
    pub fn new(start: usize, stop: usize) -> Self {
        Span { start, stop }
    }

    pub fn at(index: usize) -> Self {
        Span::new(index, index)
    }

    pub fn size(&self) -> usize {
        self.stop - self.start + 1
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.start, self.stop)
    }
}

/// A remote service exposing named arrays that can be sliced by index.
#[async_trait]
pub trait ArrayService: Send + Sync {
    /// Reads `name` from the dataset at `url`, optionally restricted to one
    /// span per dimension. Values come back in row-major order.
    async fn read_array(
        &self,
        url: &str,
        name: &str,
        slab: Option<&[Span]>,
    ) -> Result<Vec<f64>, DapError>;

    /// Reads a string attribute of `name`.
    async fn read_attribute(
        &self,
        url: &str,
        name: &str,
        attribute: &str,
    ) -> Result<String, DapError>;
}

/// DAP2 client using ASCII data responses.
pub struct DapClient {
    client: reqwest::Client,
}

impl DapClient {
    pub fn new() -> Self {
        DapClient {
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String, DapError> {
        debug!(url, "DAP request");
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DapError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

impl Default for DapClient {
    fn default() -> Self {
        DapClient::new()
    }
}

#[async_trait]
impl ArrayService for DapClient {
    async fn read_array(
        &self,
        url: &str,
        name: &str,
        slab: Option<&[Span]>,
    ) -> Result<Vec<f64>, DapError> {
        let body = self.fetch_text(&data_url(url, name, slab)).await?;
        ascii::parse(&body, name)
    }

    async fn read_attribute(
        &self,
        url: &str,
        name: &str,
        attribute: &str,
    ) -> Result<String, DapError> {
        let body = self.fetch_text(&format!("{}.das", url)).await?;
        das::attribute(&body, name, attribute)
    }
}

fn data_url(url: &str, name: &str, slab: Option<&[Span]>) -> String {
    let constraint: String = slab
        .unwrap_or_default()
        .iter()
        .map(Span::to_string)
        .collect();

    format!("{}.ascii?{}{}", url, name, constraint)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_build_constraint_expression() {
        let url = "http://iridl.ldeo.columbia.edu/SOURCES/.u/dods";
        let slab = [Span::at(3), Span::at(0), Span::new(10, 12), Span::new(0, 191)];

        assert_eq!(data_url(url, "X", None), format!("{url}.ascii?X"));
        assert_eq!(
            data_url(url, "u", Some(&slab[..])),
            format!("{url}.ascii?u[3:3][0:0][10:12][0:191]")
        );
        assert_eq!(slab[2].size(), 3);
    }
}
