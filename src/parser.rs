//! Lenient parsers for values scraped out of free-form page text.
//!
//! Sources format dates and body measurements in many different ways. These
//! helpers pull the value out of the surrounding text and return `None`
//! when nothing usable is found, so a miss never fails a lookup.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[-/.年]\s*(\d{1,2})\s*[-/.月]\s*(\d{1,2})").unwrap()
});

static HEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{2,3})(?:\.\d+)?\s*cm").unwrap());

/// Parses the first calendar date found in `text`.
///
/// Accepts `2021-04-03`, `2021/4/3`, `2021.04.03` and `2021年4月3日`, with or
/// without a trailing time component.
///
/// # Examples
///
/// ```
/// use metascrape::parser::parse_date;
///
/// assert!(parse_date("商品登録日 2021年4月3日").is_some());
/// assert!(parse_date("unknown").is_none());
/// ```
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses a height in centimeters, e.g. `158cm` or `T158.5 cm`.
pub fn parse_height(text: &str) -> Option<u32> {
    HEIGHT_RE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 4, 3);

        assert_eq!(parse_date("2021-04-03"), expected);
        assert_eq!(parse_date("2021/4/3"), expected);
        assert_eq!(parse_date("2021.04.03 12:00:00"), expected);
        assert_eq!(parse_date("配信日: 2021年4月3日"), expected);
    }

    #[test]
    fn test_parse_date_rejects_invalid() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2021-13-40"), None);
        assert_eq!(parse_date("no date here"), None);
    }

    #[test]
    fn test_parse_height() {
        assert_eq!(parse_height("158cm"), Some(158));
        assert_eq!(parse_height("身高: 162.5 cm"), Some(162));
        assert_eq!(parse_height("unknown"), None);
    }
}
