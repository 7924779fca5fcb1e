//! In-memory stand-ins for the remote array service, used by tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    dap::{ArrayService, Span},
    error::DapError,
    variables::{Registry, Variable},
};

pub const TIME_UNITS: &str = "days since 2020-01-01";

type Array = (Vec<usize>, Vec<f64>);

/// Serves arrays and attributes from memory, keyed by dataset URL and name.
#[derive(Default)]
pub struct FakeService {
    arrays: HashMap<(String, String), Array>,
    attributes: HashMap<(String, String, String), String>,
    reads: Mutex<HashMap<String, usize>>,
}

impl FakeService {
    /// Every source of every variable on the same axes. `value` receives the
    /// field name and the `(t, y, x)` indices in source order.
    pub fn ncep(
        registry: &Registry,
        lat: &[f64],
        lon: &[f64],
        days: &[f64],
        value: impl Fn(&str, usize, usize, usize) -> f64,
    ) -> Self {
        let mut service = FakeService::default();
        for variable in Variable::ALL {
            for source in &registry.entry(variable).sources {
                service.insert_dataset(&source.url, source.field, lat, lon, days, |t, y, x| {
                    value(source.field, t, y, x)
                });
            }
        }
        service
    }

    /// A `(T, level, Y, X)` field with its coordinate and time axes.
    pub fn insert_dataset(
        &mut self,
        url: &str,
        field: &str,
        lat: &[f64],
        lon: &[f64],
        days: &[f64],
        value: impl Fn(usize, usize, usize) -> f64,
    ) {
        self.insert_array(url, "Y", vec![lat.len()], lat.to_vec());
        self.insert_array(url, "X", vec![lon.len()], lon.to_vec());
        self.insert_array(url, "T", vec![days.len()], days.to_vec());
        self.insert_attribute(url, "T", "units", TIME_UNITS);

        let mut values = Vec::with_capacity(days.len() * lat.len() * lon.len());
        for t in 0..days.len() {
            for y in 0..lat.len() {
                for x in 0..lon.len() {
                    values.push(value(t, y, x));
                }
            }
        }
        self.insert_array(url, field, vec![days.len(), 1, lat.len(), lon.len()], values);
    }

    pub fn insert_array(&mut self, url: &str, name: &str, shape: Vec<usize>, values: Vec<f64>) {
        self.arrays
            .insert((url.to_string(), name.to_string()), (shape, values));
    }

    pub fn insert_attribute(&mut self, url: &str, name: &str, attribute: &str, value: &str) {
        self.attributes.insert(
            (url.to_string(), name.to_string(), attribute.to_string()),
            value.to_string(),
        );
    }

    /// Number of requests for an array `name`, or `name.attribute`, across
    /// all datasets.
    pub fn reads(&self, name: &str) -> usize {
        self.reads.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    fn record(&self, name: String) {
        *self.reads.lock().unwrap().entry(name).or_default() += 1;
    }
}

#[async_trait]
impl ArrayService for FakeService {
    async fn read_array(
        &self,
        url: &str,
        name: &str,
        slab: Option<&[Span]>,
    ) -> Result<Vec<f64>, DapError> {
        self.record(name.to_string());
        let (shape, values) = self
            .arrays
            .get(&(url.to_string(), name.to_string()))
            .ok_or_else(|| DapError::MissingVariable(name.to_string()))?;

        let Some(slab) = slab else {
            return Ok(values.clone());
        };

        if slab.len() != shape.len()
            || slab
                .iter()
                .zip(shape)
                .any(|(s, &n)| s.start > s.stop || s.stop >= n)
        {
            return Err(DapError::Malformed(format!("bad slab for {name}: {slab:?}")));
        }

        // Walk the slab in row-major order.
        let mut out = Vec::new();
        let mut index: Vec<usize> = slab.iter().map(|s| s.start).collect();
        loop {
            let flat = index
                .iter()
                .zip(shape)
                .fold(0, |acc, (&i, &n)| acc * n + i);
            out.push(values[flat]);

            let mut d = slab.len();
            loop {
                if d == 0 {
                    return Ok(out);
                }
                d -= 1;
                if index[d] < slab[d].stop {
                    index[d] += 1;
                    break;
                }
                index[d] = slab[d].start;
            }
        }
    }

    async fn read_attribute(
        &self,
        url: &str,
        name: &str,
        attribute: &str,
    ) -> Result<String, DapError> {
        self.record(format!("{name}.{attribute}"));
        self.attributes
            .get(&(url.to_string(), name.to_string(), attribute.to_string()))
            .cloned()
            .ok_or_else(|| DapError::MissingAttribute {
                variable: name.to_string(),
                attribute: attribute.to_string(),
            })
    }
}
