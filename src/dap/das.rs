//! Parser for DAP2 attribute responses (`<url>.das`).

use crate::error::DapError;

/// Looks up a string attribute of `variable`, e.g. the `units` of `T`.
pub fn attribute(body: &str, variable: &str, attribute: &str) -> Result<String, DapError> {
    let mut path: Vec<&str> = Vec::new();

    for line in body.lines().map(str::trim) {
        if let Some(block) = line.strip_suffix('{') {
            path.push(block.trim());
            continue;
        }
        if line.starts_with('}') {
            path.pop();
            continue;
        }

        // `Attributes { <var> { String units "..."; } }`
        if path.last() != Some(&variable) {
            continue;
        }

        let mut parts = line.splitn(3, char::is_whitespace);
        let (Some(_kind), Some(name), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        if name == attribute {
            return Ok(unquote(value));
        }
    }

    Err(DapError::MissingAttribute {
        variable: variable.to_string(),
        attribute: attribute.to_string(),
    })
}

fn unquote(value: &str) -> String {
    value
        .trim()
        .trim_end_matches(';')
        .trim()
        .trim_matches('"')
        .to_string()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const DAS: &str = r#"Attributes {
    X {
        String units "degree_east";
    }
    T {
        String units "days since 1960-01-01";
        String calendar "standard";
        Float32 pointwidth 1.0;
    }
    temp {
        String units "Kelvin_scale";
        NC_GLOBAL {
            String units "ignored";
        }
    }
}"#;

    #[test]
    fn should_find_time_units() {
        assert_eq!(attribute(DAS, "T", "units").unwrap(), "days since 1960-01-01");
        assert_eq!(attribute(DAS, "T", "calendar").unwrap(), "standard");
    }

    #[test]
    fn should_read_variable_not_nested_block() {
        assert_eq!(attribute(DAS, "temp", "units").unwrap(), "Kelvin_scale");
    }

    #[test]
    fn should_report_missing_attribute() {
        let err = attribute(DAS, "Y", "units").unwrap_err();
        assert!(matches!(err, DapError::MissingAttribute { .. }));
    }
}
