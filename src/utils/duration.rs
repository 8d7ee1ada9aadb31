//! Duration-string parsing for expiry options
//!
//! Accepts the short forms used by the chat commands and the REST API:
//! `90s`, `45m`, `12h`, `7d`, `2w`, `6mo`, `1y`. A month counts as 30 days
//! and a year as 365 days.

use chrono::Duration;
use regex::Regex;
use std::sync::OnceLock;

use crate::utils::errors::{KosError, Result};

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)\s*(s|m|h|d|w|mo|y)$").expect("valid regex"))
}

/// Parse a duration string like `7d` or `6mo` into a positive duration.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let normalized = input.trim().to_lowercase();
    let captures = pattern().captures(&normalized).ok_or_else(|| {
        KosError::Validation(format!(
            "Invalid duration format: '{input}'. Use formats like: 7d, 30d, 1y, 6mo"
        ))
    })?;

    let amount: i64 = captures[1]
        .parse()
        .map_err(|_| KosError::Validation(format!("Duration value too large: '{input}'")))?;
    if amount == 0 {
        return Err(KosError::Validation(
            "Duration must be greater than zero".to_string(),
        ));
    }

    let duration = match &captures[2] {
        "s" => Duration::seconds(amount),
        "m" => Duration::minutes(amount),
        "h" => Duration::hours(amount),
        "d" => Duration::days(amount),
        "w" => Duration::weeks(amount),
        "mo" => Duration::days(amount * 30),
        "y" => Duration::days(amount * 365),
        _ => unreachable!("pattern restricts units"),
    };

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_common_forms() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("30d").unwrap(), Duration::days(30));
        assert_eq!(parse_duration("1y").unwrap(), Duration::days(365));
        assert_eq!(parse_duration("6mo").unwrap(), Duration::days(180));
        assert_eq!(parse_duration("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_duration("45m").unwrap(), Duration::minutes(45));
        assert_eq!(parse_duration("2w").unwrap(), Duration::weeks(2));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(parse_duration(" 7D ").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("6 MO").unwrap(), Duration::days(180));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_matches!(parse_duration("soon"), Err(KosError::Validation(_)));
        assert_matches!(parse_duration("7x"), Err(KosError::Validation(_)));
        assert_matches!(parse_duration(""), Err(KosError::Validation(_)));
        assert_matches!(parse_duration("-7d"), Err(KosError::Validation(_)));
        assert_matches!(parse_duration("d7"), Err(KosError::Validation(_)));
    }

    #[test]
    fn rejects_zero() {
        assert_matches!(parse_duration("0d"), Err(KosError::Validation(_)));
    }

    #[test]
    fn rejects_overflowing_amount() {
        assert_matches!(
            parse_duration("99999999999999999999d"),
            Err(KosError::Validation(_))
        );
    }
}
