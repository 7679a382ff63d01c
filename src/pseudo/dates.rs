//! Date-of-birth shifting.
//!
//! A DOB is replaced by shifting it a cluster-deterministic number of days
//! in `[-3650, +3650]` while re-rendering it in the original surface format:
//! separator, zero padding, month-name length, comma, and ordinal suffix all
//! follow the source text.

use crate::models::DateFormat;
use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;

const MONTHS_FULL: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS_ABBREV: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Shift `normalized` (`YYYY-MM-DD`) and render it like `source`.
///
/// Returns `None` when the normalized date cannot be parsed; callers fall
/// back to an opaque placeholder in that case.
pub fn shifted_date_like(
    source: &str,
    normalized: &str,
    format: DateFormat,
    rng: &mut StdRng,
) -> Option<String> {
    let date = NaiveDate::parse_from_str(normalized, "%Y-%m-%d").ok()?;
    let mut offset = rng.gen_range(-3650i64..=3650);
    if offset == 0 {
        offset = 1;
    }
    let shifted = date.checked_add_signed(Duration::days(offset))?;
    Some(render_like(source, shifted, format))
}

fn render_like(source: &str, date: NaiveDate, format: DateFormat) -> String {
    let (year, month, day) = (date.year(), date.month(), date.day());
    match format {
        DateFormat::Iso => format!("{year:04}-{month:02}-{day:02}"),
        DateFormat::MdyNumeric => {
            let sep = if source.contains('/') { '/' } else { '-' };
            let parts: Vec<&str> = source.split(['/', '-']).collect();
            let pad_month = parts.first().is_some_and(|p| p.len() == 2);
            let pad_day = parts.get(1).is_some_and(|p| p.len() == 2);
            let month_s = if pad_month {
                format!("{month:02}")
            } else {
                month.to_string()
            };
            let day_s = if pad_day {
                format!("{day:02}")
            } else {
                day.to_string()
            };
            format!("{month_s}{sep}{day_s}{sep}{year:04}")
        }
        DateFormat::MonthDayYear | DateFormat::DayMonthYear => {
            let source_month = source
                .split_whitespace()
                .find(|t| t.chars().next().is_some_and(char::is_alphabetic))
                .unwrap_or("");
            let abbreviated = !MONTHS_FULL
                .iter()
                .any(|m| m.eq_ignore_ascii_case(source_month.trim_end_matches('.')));
            let mut month_name = if abbreviated {
                MONTHS_ABBREV[(month - 1) as usize].to_string()
            } else {
                MONTHS_FULL[(month - 1) as usize].to_string()
            };
            if source_month.chars().all(|c| !c.is_lowercase()) && !source_month.is_empty() {
                month_name = month_name.to_uppercase();
            }
            let lower = source.to_lowercase();
            let has_ordinal = ["st", "nd", "rd", "th"].iter().any(|suffix| {
                lower
                    .split_whitespace()
                    .any(|t| t.trim_end_matches(',').ends_with(suffix) && t.starts_with(|c: char| c.is_ascii_digit()))
            });
            let day_s = if has_ordinal {
                format!("{day}{}", ordinal_suffix(day))
            } else {
                day.to_string()
            };
            match format {
                DateFormat::MonthDayYear => {
                    let comma = if source.contains(',') { "," } else { "" };
                    format!("{month_name} {day_s}{comma} {year}")
                }
                _ => format!("{day_s} {month_name} {year}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pseudo::seed::{KeyScope, SeedMaterial};

    fn rng() -> StdRng {
        SeedMaterial::derive(Some("test-secret"), KeyScope::PerDocument, "doc")
            .cluster_key("person", "john doe")
            .mention_rng("dob", 0)
    }

    #[test]
    fn shifts_and_keeps_month_name_format() {
        let mut r = rng();
        let out = shifted_date_like("July 4, 1982", "1982-07-04", DateFormat::MonthDayYear, &mut r)
            .unwrap();
        assert_ne!(out, "July 4, 1982");
        let re = regex::Regex::new(r"^[A-Z][a-z]+ \d{1,2}, \d{4}$").unwrap();
        assert!(re.is_match(&out), "format lost: {out}");
    }

    #[test]
    fn keeps_numeric_padding() {
        let mut r = rng();
        let out =
            shifted_date_like("07/04/1982", "1982-07-04", DateFormat::MdyNumeric, &mut r).unwrap();
        let re = regex::Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap();
        assert!(re.is_match(&out), "padding lost: {out}");

        let out2 =
            shifted_date_like("7/4/1982", "1982-07-04", DateFormat::MdyNumeric, &mut r).unwrap();
        let re2 = regex::Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap();
        assert!(re2.is_match(&out2));
    }

    #[test]
    fn keeps_iso_format() {
        let mut r = rng();
        let out = shifted_date_like("1982-07-04", "1982-07-04", DateFormat::Iso, &mut r).unwrap();
        let re = regex::Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
        assert!(re.is_match(&out));
    }

    #[test]
    fn shift_is_bounded() {
        let mut r = rng();
        let out = shifted_date_like("1982-07-04", "1982-07-04", DateFormat::Iso, &mut r).unwrap();
        let original = NaiveDate::parse_from_str("1982-07-04", "%Y-%m-%d").unwrap();
        let shifted = NaiveDate::parse_from_str(&out, "%Y-%m-%d").unwrap();
        let delta = (shifted - original).num_days().abs();
        assert!(delta > 0 && delta <= 3650, "shift out of range: {delta}");
    }

    #[test]
    fn same_cluster_same_shift() {
        let a = shifted_date_like("July 4, 1982", "1982-07-04", DateFormat::MonthDayYear, &mut rng());
        let b = shifted_date_like("July 4, 1982", "1982-07-04", DateFormat::MonthDayYear, &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn day_month_year_order_preserved() {
        let mut r = rng();
        let out =
            shifted_date_like("4 July 1982", "1982-07-04", DateFormat::DayMonthYear, &mut r).unwrap();
        let re = regex::Regex::new(r"^\d{1,2} [A-Z][a-z]+ \d{4}$").unwrap();
        assert!(re.is_match(&out), "order lost: {out}");
    }
}
