//! Example value synthesis for generators.
//!
//! Values are recomputed on every call; only the declarations are stable.

use bigdecimal::BigDecimal;
use chrono::{SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use super::date_format;
use super::UuidFormat;

const HEX_DIGITS: &[u8] = b"0123456789ABCDEF";

/// Which part of the current moment an ISO default renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Date,
    Time,
    DateTime,
}

pub fn random_bool() -> bool {
    rand::thread_rng().gen()
}

pub fn random_int(min: i64, max: i64) -> i64 {
    rand::thread_rng().gen_range(min..=max)
}

/// A decimal with exactly `digits` significant digits and no zeros, so the
/// digit count survives rendering.
pub fn random_decimal(digits: u8) -> BigDecimal {
    let mut rng = rand::thread_rng();
    let mut text: String = (0..digits.max(1))
        .map(|_| char::from(b'0' + rng.gen_range(1..=9)))
        .collect();
    if text.len() > 1 {
        let point = rng.gen_range(1..text.len());
        text.insert(point, '.');
    }
    text.parse().unwrap_or_else(|_| BigDecimal::from(1))
}

pub fn random_hexadecimal(digits: u8) -> String {
    let mut rng = rand::thread_rng();
    (0..digits)
        .map(|_| char::from(HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())]))
        .collect()
}

pub fn random_string(size: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}

pub fn uuid(format: UuidFormat) -> String {
    format.render(&Uuid::new_v4())
}

/// The current moment, rendered with a Java-style pattern or an ISO default.
pub fn now(moment: Moment, pattern: Option<&str>) -> Result<String, String> {
    let current = Utc::now();
    match (pattern, moment) {
        (Some(pattern), _) => date_format::render(&current, pattern),
        (None, Moment::Date) => Ok(current.format("%Y-%m-%d").to_string()),
        (None, Moment::Time) => Ok(current.format("%H:%M:%SZ").to_string()),
        (None, Moment::DateTime) => Ok(current.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_int_stays_in_range() {
        for _ in 0..200 {
            let value = random_int(-3, 3);
            assert!((-3..=3).contains(&value));
        }
        assert_eq!(random_int(5, 5), 5);
    }

    #[test]
    fn test_random_decimal_digit_count() {
        for digits in 1..=9u8 {
            let value = random_decimal(digits).to_string();
            let count = value.chars().filter(char::is_ascii_digit).count();
            assert_eq!(count, usize::from(digits), "value {value}");
        }
    }

    #[test]
    fn test_random_hexadecimal() {
        let value = random_hexadecimal(12);
        assert_eq!(value.len(), 12);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_random_string() {
        let value = random_string(20);
        assert_eq!(value.len(), 20);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_uuid_formats() {
        for format in UuidFormat::ALL {
            let value = uuid(format);
            let pattern = regex::Regex::new(format.matching_regex()).unwrap();
            assert!(pattern.is_match(&value), "{value} vs {format:?}");
        }
    }

    #[test]
    fn test_iso_defaults() {
        let date = now(Moment::Date, None).unwrap();
        assert!(regex::Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap().is_match(&date));
        let datetime = now(Moment::DateTime, None).unwrap();
        assert!(datetime.ends_with('Z'));
        assert!(now(Moment::Time, Some("HH:mm")).unwrap().len() == 5);
    }
}
