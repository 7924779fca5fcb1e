//! Decoding of numeric time axes into calendar datetimes.
//!
//! Supports CF style `<unit> since <reference>` units on the proleptic
//! Gregorian calendar, and the IRI Data Library's `julian_day` convention.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::DapError;

/// Julian day number of 0000-12-31T00:00, i.e. day zero of `num_days_from_ce`.
const JULIAN_DAY_CE_EPOCH: f64 = 1_721_424.5;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub fn decode(units: &str, values: &[f64]) -> Result<Vec<NaiveDateTime>, DapError> {
    let (reference, millis_per_unit) = parse_units(units)?;

    values
        .iter()
        .map(|&v| {
            let offset = Duration::milliseconds((v * millis_per_unit).round() as i64);
            reference
                .checked_add_signed(offset)
                .ok_or_else(|| DapError::TimeUnits(format!("{units} (value {v})")))
        })
        .collect()
}

fn parse_units(units: &str) -> Result<(NaiveDateTime, f64), DapError> {
    let err = || DapError::TimeUnits(units.to_string());
    let trimmed = units.trim();

    if trimmed.eq_ignore_ascii_case("julian_day") {
        let epoch = NaiveDate::from_num_days_from_ce_opt(0)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(err)?;
        let reference = epoch
            .checked_add_signed(Duration::milliseconds(
                (-JULIAN_DAY_CE_EPOCH * MILLIS_PER_DAY) as i64,
            ))
            .ok_or_else(err)?;
        return Ok((reference, MILLIS_PER_DAY));
    }

    let (unit, reference) = trimmed.split_once(" since ").ok_or_else(err)?;
    let millis = match unit.trim().to_lowercase().as_str() {
        "days" | "day" | "d" => MILLIS_PER_DAY,
        "hours" | "hour" | "hr" | "h" => 3_600_000.0,
        "minutes" | "minute" | "min" => 60_000.0,
        "seconds" | "second" | "sec" | "s" => 1_000.0,
        _ => return Err(err()),
    };

    Ok((parse_reference(reference).ok_or_else(err)?, millis))
}

fn parse_reference(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_end_matches('Z').trim_end_matches(" UTC").trim();

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn should_decode_days_since() {
        let t = decode("days since 2020-01-01", &[0.0, 1.0, 31.0]).unwrap();

        assert_eq!(t[0].date(), ymd(2020, 1, 1));
        assert_eq!(t[1].date(), ymd(2020, 1, 2));
        assert_eq!(t[2].date(), ymd(2020, 2, 1));
    }

    #[test]
    fn should_decode_hours_with_fractional_reference() {
        let t = decode("hours since 1800-1-1 00:00:0.0", &[48.0]).unwrap();
        assert_eq!(t[0].date(), ymd(1800, 1, 3));
    }

    #[test]
    fn should_decode_julian_day() {
        let t = decode("julian_day", &[2_458_849.5, 2_458_850.0]).unwrap();

        assert_eq!(t[0], ymd(2020, 1, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(t[1], ymd(2020, 1, 1).and_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn should_reject_unknown_units() {
        assert!(decode("months since 2020-01-01", &[1.0]).is_err());
        assert!(decode("kelvin", &[1.0]).is_err());
    }
}
