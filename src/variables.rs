//! Registry of the reanalysis variables and where they come from.

use std::fmt;

use clap::ValueEnum;
use reqwest::Url;

use crate::{error::ConfigError, table::TableRef};

/// Native grid spacing of the CDAS-1 daily diagnostics, in degrees.
pub const RESOLUTION: f64 = 1.875;

/// Default base of the IRI Data Library catalogue.
pub const IRIDL_SOURCES: &str = "http://iridl.ldeo.columbia.edu/SOURCES/";

const DAILY: &str = ".NOAA/.NCEP-NCAR/.CDAS-1/.DAILY/.Diagnostic/.above_ground";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Variable {
    Tmax,
    Tmin,
    Wind,
}

impl Variable {
    /// Order in which a run processes variables.
    pub const ALL: [Variable; 3] = [Variable::Tmax, Variable::Tmin, Variable::Wind];

    pub fn name(&self) -> &'static str {
        match self {
            Variable::Tmax => "tmax",
            Variable::Tmin => "tmin",
            Variable::Wind => "wind",
        }
    }

    /// Destination table, `<variable>.ncep`.
    pub fn table(&self) -> TableRef {
        TableRef {
            schema: self.name().to_string(),
            table: "ncep".to_string(),
        }
    }

    // (dataset path relative to the catalogue, field)
    fn paths(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Variable::Tmax => &[(".maximum/.temp/dods", "temp")],
            Variable::Tmin => &[(".minimum/.temp/dods", "temp")],
            Variable::Wind => &[(".u/dods", "u"), (".v/dods", "v")],
        }
    }

    fn combine(&self) -> Combine {
        match self {
            Variable::Wind => Combine::Magnitude,
            _ => Combine::Single,
        }
    }

    fn conversion(&self) -> Conversion {
        match self {
            Variable::Tmax | Variable::Tmin => Conversion::KelvinToCelsius,
            Variable::Wind => Conversion::None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the slices of a multi-source variable are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    Single,
    /// Elementwise vector magnitude of all components.
    Magnitude,
}

impl Combine {
    /// Merges equally shaped component slices.
    pub fn apply(&self, mut components: Vec<Vec<f32>>) -> Vec<f32> {
        match self {
            Combine::Single => components.swap_remove(0),
            Combine::Magnitude => {
                let n = components[0].len();
                (0..n)
                    .map(|k| components.iter().map(|c| c[k] * c[k]).sum::<f32>().sqrt())
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    None,
    KelvinToCelsius,
}

impl Conversion {
    pub fn apply(&self, values: &mut [f32]) {
        match self {
            Conversion::None => {}
            Conversion::KelvinToCelsius => values.iter_mut().for_each(|v| *v -= 273.15),
        }
    }
}

/// One remote array contributing to a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub url: String,
    pub field: &'static str,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub variable: Variable,
    pub sources: Vec<Source>,
    pub combine: Combine,
    pub conversion: Conversion,
}

/// Resolved and validated source descriptions for every variable.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// Resolves every variable's datasets against the catalogue at `base`.
    pub fn new(base: &str) -> Result<Self, ConfigError> {
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };

        let entries = Variable::ALL
            .iter()
            .map(|&variable| {
                let invalid = |reason: String| ConfigError::InvalidSource {
                    variable: variable.to_string(),
                    reason,
                };

                let root = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
                if !matches!(root.scheme(), "http" | "https") {
                    return Err(invalid(format!("unsupported scheme `{}`", root.scheme())));
                }

                let sources = variable
                    .paths()
                    .iter()
                    .map(|&(path, field)| {
                        let url = root
                            .join(&format!("{}/{}", DAILY, path))
                            .map_err(|e| invalid(e.to_string()))?;
                        Ok(Source {
                            url: url.to_string(),
                            field,
                        })
                    })
                    .collect::<Result<Vec<_>, ConfigError>>()?;

                let entry = Entry {
                    variable,
                    sources,
                    combine: variable.combine(),
                    conversion: variable.conversion(),
                };
                validate(&entry).map_err(invalid)?;

                Ok(entry)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Registry { entries })
    }

    pub fn entry(&self, variable: Variable) -> &Entry {
        // Entries follow the declaration order of `Variable::ALL`.
        &self.entries[variable as usize]
    }

    /// Table whose last date marks the end of the previous complete run:
    /// wind is the last variable a run writes.
    pub fn resume_table(&self) -> TableRef {
        Variable::Wind.table()
    }
}

fn validate(entry: &Entry) -> Result<(), String> {
    match (entry.combine, entry.sources.len()) {
        (_, 0) => Err("no sources".to_string()),
        (Combine::Single, 1) => Ok(()),
        (Combine::Single, n) => Err(format!("single-source variable has {} sources", n)),
        (Combine::Magnitude, 1) => Err("magnitude needs at least two components".to_string()),
        (Combine::Magnitude, _) => Ok(()),
    }
}

// -- Tests -------------------------------------------------------------------
