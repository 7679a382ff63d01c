//! Date detector with DOB promotion.
//!
//! Recognized surface formats (case-insensitive):
//!
//! ```text
//! Month D, YYYY   e.g. "July 4, 1982" (comma optional, ordinals tolerated)
//! D Month YYYY    e.g. "4 July 1982"
//! YYYY-MM-DD      ISO style with four digit year
//! M/D/YYYY        or M-D-YYYY with a four digit year (US ordering)
//! ```
//!
//! Dates are emitted as `DATE_GENERIC` with a normalized `YYYY-MM-DD`
//! attribute when the components form a valid Gregorian date. A second span
//! with label `DOB` and identical boundaries is emitted when a birth trigger
//! (`DOB`, `D.O.B.`, `Date of Birth`, `birthdate`, `born on`, `born:`)
//! appears within 40 characters of the date; the merger keeps the stronger
//! DOB span.

use super::rtrim_index;
use crate::models::{DateFormat, EntityLabel, Span, SpanAttrs};
use regex::Regex;

const MONTHS: [(&str, u32); 24] = [
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTHS.iter().find(|(n, _)| *n == lower).map(|&(_, v)| v)
}

fn is_leap(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

fn normalize_date(year: i32, month: u32, day: u32) -> Option<String> {
    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
        return None;
    }
    Some(format!("{year:04}-{month:02}-{day:02}"))
}

const DOB_WINDOW: usize = 40;

pub struct DateDetector {
    month_name: Regex,
    iso: Regex,
    mdy: Regex,
    triggers: Regex,
}

impl DateDetector {
    pub fn new() -> Self {
        let month_pattern = "january|february|march|april|august|september|october|november|december|june|july|sept|jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";
        let month_name = Regex::new(&format!(
            r"(?ix)\b(?:
                (?P<month1>{m})\x20(?P<day1>\d{{1,2}})(?:st|nd|rd|th)?,?\x20(?P<year1>\d{{4}})
                |
                (?P<day2>\d{{1,2}})(?:st|nd|rd|th)?\x20(?P<month2>{m})\x20(?P<year2>\d{{4}})
            )\b",
            m = month_pattern
        ))
        .unwrap();
        let iso = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();
        let mdy = Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").unwrap();
        let triggers = Regex::new(
            r"(?i)\bD\.?\s*O\.?\s*B\b\.?|\bdate\s+of\s+birth\b|\bbirth\s?date\b|\bborn\s+on\b|\bborn:",
        )
        .unwrap();
        Self {
            month_name,
            iso,
            mdy,
            triggers,
        }
    }

    pub fn detect(&self, text: &str) -> Vec<Span> {
        let mut spans: Vec<Span> = Vec::new();

        for caps in self.month_name.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let (month_s, day_s, year_s, format) = if caps.name("month1").is_some() {
                (
                    caps.name("month1").unwrap().as_str(),
                    caps.name("day1").unwrap().as_str(),
                    caps.name("year1").unwrap().as_str(),
                    DateFormat::MonthDayYear,
                )
            } else {
                (
                    caps.name("month2").unwrap().as_str(),
                    caps.name("day2").unwrap().as_str(),
                    caps.name("year2").unwrap().as_str(),
                    DateFormat::DayMonthYear,
                )
            };
            let normalized = month_number(month_s).and_then(|m| {
                normalize_date(
                    year_s.parse().ok()?,
                    m,
                    day_s.parse().ok()?,
                )
            });
            self.emit(text, whole.start(), whole.end(), format, normalized, &mut spans, 0.97);
        }

        for caps in self.iso.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let normalized = normalize_date(
                caps[1].parse().unwrap_or(0),
                caps[2].parse().unwrap_or(0),
                caps[3].parse().unwrap_or(0),
            );
            self.emit(
                text,
                whole.start(),
                whole.end(),
                DateFormat::Iso,
                normalized,
                &mut spans,
                0.97,
            );
        }

        for caps in self.mdy.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            if spans.iter().any(|s| s.start < whole.end() && whole.start() < s.end) {
                continue;
            }
            let normalized = normalize_date(
                caps[3].parse().unwrap_or(0),
                caps[1].parse().unwrap_or(0),
                caps[2].parse().unwrap_or(0),
            );
            self.emit(
                text,
                whole.start(),
                whole.end(),
                DateFormat::MdyNumeric,
                normalized,
                &mut spans,
                0.94,
            );
        }

        spans.sort_by_key(|s| (s.start, s.end, s.label.precedence()));
        spans
    }

    fn emit(
        &self,
        text: &str,
        start: usize,
        end: usize,
        format: DateFormat,
        normalized: Option<String>,
        spans: &mut Vec<Span>,
        confidence: f64,
    ) {
        let end = rtrim_index(text, end);
        if end <= start {
            return;
        }
        let surface = &text[start..end];
        let attrs = SpanAttrs {
            date_format: Some(format),
            normalized_date: normalized.clone(),
            ..Default::default()
        };
        spans.push(
            Span::new(
                start,
                end,
                surface,
                EntityLabel::DateGeneric,
                "dates",
                confidence,
            )
            .with_attrs(attrs.clone()),
        );

        // DOB promotion requires a calendar-valid date plus a nearby trigger.
        if normalized.is_none() {
            return;
        }
        if let Some(trigger) = self.nearby_trigger(text, start, end) {
            let attrs = SpanAttrs {
                trigger: Some(trigger),
                ..attrs
            };
            spans.push(
                Span::new(start, end, surface, EntityLabel::Dob, "dates", 0.99).with_attrs(attrs),
            );
        }
    }

    fn nearby_trigger(&self, text: &str, start: usize, end: usize) -> Option<String> {
        let window_start = floor_char_boundary(text, start.saturating_sub(DOB_WINDOW));
        let window_end = ceil_char_boundary(text, (end + DOB_WINDOW).min(text.len()));
        self.triggers
            .find(&text[window_start..window_end])
            .map(|m| m.as_str().trim().to_string())
    }
}

fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

impl Default for DateDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Vec<Span> {
        DateDetector::new().detect(text)
    }

    #[test]
    fn recognizes_all_formats() {
        for (sample, normalized) in [
            ("July 4, 1982", "1982-07-04"),
            ("4 July 1982", "1982-07-04"),
            ("1982-07-04", "1982-07-04"),
            ("7/4/1982", "1982-07-04"),
            ("07-04-1982", "1982-07-04"),
        ] {
            let spans = detect(sample);
            assert_eq!(spans.len(), 1, "missed {sample}");
            assert_eq!(
                spans[0].attrs.normalized_date.as_deref(),
                Some(normalized),
                "wrong normalization for {sample}"
            );
        }
    }

    #[test]
    fn invalid_dates_have_no_normalization() {
        let spans = detect("recorded 2021-02-30 in the ledger");
        assert_eq!(spans.len(), 1);
        assert!(spans[0].attrs.normalized_date.is_none());
    }

    #[test]
    fn tolerates_ordinals() {
        let spans = detect("June 3rd, 2019");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].attrs.normalized_date.as_deref(), Some("2019-06-03"));
    }

    #[test]
    fn promotes_dob_near_trigger() {
        let spans = detect("John Doe was born on July 4, 1982.");
        let labels: Vec<EntityLabel> = spans.iter().map(|s| s.label).collect();
        assert!(labels.contains(&EntityLabel::DateGeneric));
        assert!(labels.contains(&EntityLabel::Dob));
        let dob = spans.iter().find(|s| s.label == EntityLabel::Dob).unwrap();
        assert_eq!(dob.text, "July 4, 1982");
        assert_eq!(dob.attrs.trigger.as_deref(), Some("born on"));
    }

    #[test]
    fn dob_trigger_variants() {
        for sample in [
            "DOB: 7/4/1982",
            "D.O.B. 7/4/1982",
            "Date of Birth: 7/4/1982",
            "birthdate 7/4/1982",
        ] {
            let spans = detect(sample);
            assert!(
                spans.iter().any(|s| s.label == EntityLabel::Dob),
                "no DOB for {sample}"
            );
        }
    }

    #[test]
    fn distant_trigger_does_not_promote() {
        let filler = "x".repeat(60);
        let text = format!("born on {filler} July 4, 1982");
        let spans = detect(&text);
        assert!(spans.iter().all(|s| s.label != EntityLabel::Dob));
    }

    #[test]
    fn plain_dates_stay_generic() {
        let spans = detect("The lease commenced on March 1, 2020.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].label, EntityLabel::DateGeneric);
    }
}
