//! Purchase-date extraction.

use chrono::NaiveDate;

use crate::models::receipt::LocaleHint;

use super::patterns::{
    DATE_DASH, DATE_DAY_FIRST, DATE_DOT, DATE_ISO, DATE_MONTH_FIRST, DATE_SLASH,
};

/// Find the most likely purchase date within the transcript's leading lines.
///
/// Recognizes ISO, slash, dash, and dot numeric forms plus English month
/// names. Ambiguous numeric forms are resolved by the locale hint; with no
/// hint, month-first is tried and day-first is the fallback when month-first
/// yields an impossible date.
pub fn extract_date(transcript: &str, locale: LocaleHint, scan_lines: usize) -> Option<NaiveDate> {
    for line in transcript.lines().take(scan_lines) {
        if let Some(date) = extract_from_line(line, locale) {
            return Some(date);
        }
    }
    None
}

fn extract_from_line(line: &str, locale: LocaleHint) -> Option<NaiveDate> {
    if let Some(caps) = DATE_ISO.captures(line) {
        let year: i32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_MONTH_FIRST.captures(line) {
        let month = month_to_number(&caps[1]);
        let day: u32 = caps[2].parse().unwrap_or(0);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_DAY_FIRST.captures(line) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month = month_to_number(&caps[2]);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    for pattern in [&*DATE_SLASH, &*DATE_DASH] {
        if let Some(caps) = pattern.captures(line) {
            let a: u32 = caps[1].parse().unwrap_or(0);
            let b: u32 = caps[2].parse().unwrap_or(0);
            let year = parse_year(&caps[3]);
            let day_first = matches!(locale, LocaleHint::Intl);
            if let Some(date) = resolve_ambiguous(a, b, year, day_first) {
                return Some(date);
            }
        }
    }

    // Dot form is the day-first convention (DD.MM.YYYY).
    if let Some(caps) = DATE_DOT.captures(line) {
        let a: u32 = caps[1].parse().unwrap_or(0);
        let b: u32 = caps[2].parse().unwrap_or(0);
        let year = parse_year(&caps[3]);
        let day_first = !matches!(locale, LocaleHint::Us);
        if let Some(date) = resolve_ambiguous(a, b, year, day_first) {
            return Some(date);
        }
    }

    None
}

/// Interpret `a<sep>b<sep>year` with the preferred field order, swapping when
/// the preferred reading is impossible.
fn resolve_ambiguous(a: u32, b: u32, year: i32, day_first: bool) -> Option<NaiveDate> {
    let (first, second) = if day_first { (b, a) } else { (a, b) };
    NaiveDate::from_ymd_opt(year, first, second)
        .or_else(|| NaiveDate::from_ymd_opt(year, second, first))
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99.
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

fn month_to_number(name: &str) -> u32 {
    match name.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_form() {
        assert_eq!(
            extract_date("Receipt 2024-01-15 10:32", LocaleHint::None, 30),
            Some(date(2024, 1, 15))
        );
    }

    #[test]
    fn test_slash_form_locale_bias() {
        assert_eq!(
            extract_date("03/04/2024", LocaleHint::Us, 30),
            Some(date(2024, 3, 4))
        );
        assert_eq!(
            extract_date("03/04/2024", LocaleHint::Intl, 30),
            Some(date(2024, 4, 3))
        );
        assert_eq!(
            extract_date("03/04/2024", LocaleHint::None, 30),
            Some(date(2024, 3, 4))
        );
    }

    #[test]
    fn test_impossible_month_falls_back_to_day_first() {
        assert_eq!(
            extract_date("25/12/2023", LocaleHint::None, 30),
            Some(date(2023, 12, 25))
        );
    }

    #[test]
    fn test_dot_form_is_day_first() {
        assert_eq!(
            extract_date("15.01.2024", LocaleHint::None, 30),
            Some(date(2024, 1, 15))
        );
    }

    #[test]
    fn test_dash_form() {
        assert_eq!(
            extract_date("01-15-2024", LocaleHint::None, 30),
            Some(date(2024, 1, 15))
        );
    }

    #[test]
    fn test_month_name_forms() {
        assert_eq!(
            extract_date("Jan 15, 2024", LocaleHint::None, 30),
            Some(date(2024, 1, 15))
        );
        assert_eq!(
            extract_date("15 January 2024", LocaleHint::None, 30),
            Some(date(2024, 1, 15))
        );
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(
            extract_date("01/15/24", LocaleHint::None, 30),
            Some(date(2024, 1, 15))
        );
    }

    #[test]
    fn test_scan_window() {
        let mut text = String::new();
        for _ in 0..35 {
            text.push_str("noise\n");
        }
        text.push_str("2024-01-15");
        assert_eq!(extract_date(&text, LocaleHint::None, 30), None);
    }

    #[test]
    fn test_no_date() {
        assert_eq!(extract_date("Milk 3.99\nBread 2.49", LocaleHint::None, 30), None);
    }
}
