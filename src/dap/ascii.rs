//! Parser for DAP2 ASCII data responses (`<url>.ascii?<constraint>`).
//!
//! A response is the dataset's DDS, a line of dashes, then one block per
//! variable. Each block starts with a header such as `X[192]` or
//! `temp.temp[1][1][4][6]` followed by comma separated values. Rows of
//! multi-dimensional arrays carry an index prefix like `[0][0][3], `.

use crate::error::DapError;

/// Returns the values of the block named `name`, in row-major order.
///
/// Grid responses name their array `name.name` and their maps `name.<dim>`;
/// a block matches when its last dotted component equals `name`.
pub fn parse(body: &str, name: &str) -> Result<Vec<f64>, DapError> {
    let data = body
        .lines()
        .skip_while(|line| !is_separator(line))
        .skip(1);

    let mut values = Vec::new();
    let mut expected = None;

    for line in data {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((block, shape)) = parse_header(line) {
            if expected.is_some() {
                break;
            }
            if block.rsplit('.').next() == Some(name) {
                expected = Some(shape.iter().product::<usize>());
            }
            continue;
        }

        if expected.is_some() {
            parse_row(line, &mut values)?;
        }
    }

    match expected {
        None => Err(DapError::MissingVariable(name.to_string())),
        Some(n) if n != values.len() => Err(DapError::Malformed(format!(
            "expected {} values for `{}`, found {}",
            n,
            name,
            values.len()
        ))),
        Some(_) => Ok(values),
    }
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 10 && line.chars().all(|c| c == '-')
}

// `temp.temp[1][1][4][6]` -> ("temp.temp", [1, 1, 4, 6]). Scalars have no
// dimensions and a shape product of one.
fn parse_header(line: &str) -> Option<(&str, Vec<usize>)> {
    let first = line.chars().next()?;
    if !(first.is_ascii_alphabetic() || first == '_') || line.parse::<f64>().is_ok() {
        return None;
    }

    let (name, dims) = match line.find('[') {
        Some(pos) => (&line[..pos], &line[pos..]),
        None => (line, ""),
    };
    if name.contains(',') || name.contains(' ') {
        return None;
    }

    let shape = dims
        .split(']')
        .filter(|d| !d.is_empty())
        .map(|d| d.trim_start_matches('[').parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()?;

    Some((name, shape))
}

fn parse_row(line: &str, values: &mut Vec<f64>) -> Result<(), DapError> {
    let row = if line.starts_with('[') {
        let end = line.rfind(']').map(|p| p + 1).unwrap_or(0);
        line[end..].trim_start_matches(',')
    } else {
        line
    };

    for token in row.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let value = token
            .parse::<f64>()
            .map_err(|_| DapError::Malformed(format!("not a number: `{}`", token)))?;
        values.push(value);
    }

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const ARRAY: &str = "Dataset {
    Float32 X[X = 4];
} dods;
---------------------------------------------
X[4]
0, 1.875, 3.75, 5.625
";

    const GRID: &str = "Dataset {
    Grid {
     ARRAY:
        Float32 temp[T = 1][P = 1][Y = 2][X = 3];
     MAPS:
        Float32 T[T = 1];
        Float32 P[P = 1];
        Float32 Y[Y = 2];
        Float32 X[X = 3];
    } temp;
} dods;
---------------------------------------------
temp.temp[1][1][2][3]
[0][0][0], 273.15, 274.15, 275.15
[0][0][1], 276.15, 277.15, NaN

temp.T[1]
21915

temp.P[1]
1000

temp.Y[2]
90, 88.125

temp.X[3]
0, 1.875, 3.75
";

    #[test]
    fn should_parse_coordinate_array() {
        let x = parse(ARRAY, "X").unwrap();
        assert_eq!(x, vec![0.0, 1.875, 3.75, 5.625]);
    }

    #[test]
    fn should_parse_grid_array() {
        let v = parse(GRID, "temp").unwrap();

        assert_eq!(v.len(), 6);
        assert_eq!(v[0], 273.15);
        assert_eq!(v[4], 277.15);
        assert!(v[5].is_nan());
    }

    #[test]
    fn should_parse_grid_map() {
        assert_eq!(parse(GRID, "Y").unwrap(), vec![90.0, 88.125]);
        assert_eq!(parse(GRID, "T").unwrap(), vec![21915.0]);
    }

    #[test]
    fn should_fail_for_missing_variable() {
        let err = parse(ARRAY, "Y").unwrap_err();
        assert!(matches!(err, DapError::MissingVariable(_)));
    }

    #[test]
    fn should_fail_for_truncated_block() {
        let body = ARRAY.replace(", 5.625", "");
        let err = parse(&body, "X").unwrap_err();
        assert!(matches!(err, DapError::Malformed(_)));
    }
}
