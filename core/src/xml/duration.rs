//! Colon-delimited elapsed-time parsing (`mm:ss`, `hh:mm:ss`).

use std::time::Duration;

use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::separated_list1,
    sequence::pair,
    IResult, Parser,
};

fn component(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |s: &str| s.parse::<f64>(),
    )
    .parse(input)
}

fn clock(input: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(separated_list1(char(':'), component)).parse(input)
}

/// Parse a clock-style duration.
///
/// Two components read as `mm:ss` (minutes may exceed 59), three as
/// `hh:mm:ss`. Only the last component may carry a fraction. Returns `None`
/// for anything else, including a bare number without a colon.
pub fn parse_clock(raw: &str) -> Option<Duration> {
    let (_, parts) = clock(raw.trim()).ok()?;

    let leading_whole = parts[..parts.len().saturating_sub(1)]
        .iter()
        .all(|p| p.fract() == 0.0);
    if !leading_whole {
        return None;
    }

    let seconds = match parts.as_slice() {
        [m, s] if *s < 60.0 => m * 60.0 + s,
        [h, m, s] if *m < 60.0 && *s < 60.0 => h * 3600.0 + m * 60.0 + s,
        _ => return None,
    };
    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_seconds() {
        assert_eq!(parse_clock("01:30"), Some(Duration::from_secs(90)));
        assert_eq!(parse_clock(" 75:05 "), Some(Duration::from_secs(4505)));
        assert_eq!(parse_clock("0:07.5"), Some(Duration::from_millis(7500)));
    }

    #[test]
    fn test_hours_minutes_seconds() {
        assert_eq!(parse_clock("1:02:03"), Some(Duration::from_secs(3723)));
        assert_eq!(parse_clock("00:00:00"), Some(Duration::ZERO));
    }

    #[test]
    fn test_rejects() {
        assert_eq!(parse_clock("90"), None);
        assert_eq!(parse_clock("1:75"), None);
        assert_eq!(parse_clock("1:60:00"), None);
        assert_eq!(parse_clock("1.5:30"), None);
        assert_eq!(parse_clock("1:2:3:4"), None);
        assert_eq!(parse_clock("ab:cd"), None);
        assert_eq!(parse_clock("-1:30"), None);
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("12:"), None);
    }
}
