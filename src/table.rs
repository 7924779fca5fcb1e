//! Qualified `schema.table` references.

use std::{fmt, str::FromStr};

use crate::error::ConfigError;

/// Identifies the table a variable's daily rasters are stored in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: &str, table: &str) -> Result<Self, ConfigError> {
        Ok(TableRef {
            schema: check_identifier(schema)?,
            table: check_identifier(table)?,
        })
    }
}

impl FromStr for TableRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((schema, table)) => TableRef::new(schema, table),
            None => Err(ConfigError::MalformedTable(s.to_string())),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

// Both parts are interpolated into SQL, so only plain identifiers pass.
fn check_identifier(s: &str) -> Result<String, ConfigError> {
    let mut chars = s.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(s.to_string())
    } else {
        Err(ConfigError::InvalidIdentifier(s.to_string()))
    }
}

// -- Tests -------------------------------------------------------------------
