//! Run configuration, built once by the command line and passed down.

use std::path::PathBuf;

use crate::{error::ConfigError, table::TableRef};

#[derive(Debug, Clone)]
pub struct Config {
    /// Root under which temporary rasters are written.
    pub data_dir: PathBuf,
    pub database_url: String,
    /// Base URL of the data library catalogue.
    pub server: String,
}

impl Config {
    pub fn new(
        data_dir: Option<PathBuf>,
        database_url: String,
        server: String,
    ) -> Result<Self, ConfigError> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        Ok(Config {
            data_dir,
            database_url,
            server,
        })
    }

    /// Directory holding the rasters of `table`: `<data_dir>/<schema>/<table>`.
    pub fn table_dir(&self, table: &TableRef) -> PathBuf {
        self.data_dir.join(&table.schema).join(&table.table)
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("ncep"))
        .ok_or(ConfigError::MissingDataDir)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_lay_out_table_dir() {
        let config = Config::new(
            Some(PathBuf::from("/data")),
            "sqlite::memory:".to_string(),
            "http://localhost/".to_string(),
        )
        .unwrap();
        let table: TableRef = "tmin.ncep".parse().unwrap();

        assert_eq!(config.table_dir(&table), PathBuf::from("/data/tmin/ncep"));
    }
}
