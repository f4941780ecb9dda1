//! Market-cap string normalization.
//!
//! Upstream sources report market cap as display strings such as `"4.7K"`,
//! `"2.1M"` or `"$1,234"`. Snapshots store plain USD numbers.

/// Parse a human-readable market cap into USD.
///
/// - empty input yields `None`
/// - a trailing `K` or `M` scales the leading numeric prefix by 1e3 or 1e6
/// - anything else has every character other than digits and `.` stripped
///   before parsing
///
/// Returns `None` whenever no finite number can be read.
pub fn parse_market_cap(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }

    let value = if raw.ends_with('K') {
        leading_float(raw)? * 1_000.0
    } else if raw.ends_with('M') {
        leading_float(raw)? * 1_000_000.0
    } else {
        let digits: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        leading_float(&digits)?
    };

    value.is_finite().then_some(value)
}

/// Longest numeric prefix of `s` (after leading whitespace), if any.
///
/// Accepts an optional sign, digits with at most one decimal point, and an
/// exponent only when it is followed by at least one digit.
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let mut seen_digit = false;
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        if b.is_ascii_digit() {
            seen_digit = true;
        } else if b == b'.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes() {
        assert_eq!(parse_market_cap("4.7K"), Some(4700.0));
        assert_eq!(parse_market_cap("2.1M"), Some(2_100_000.0));
        assert_eq!(parse_market_cap("12K"), Some(12_000.0));
    }

    #[test]
    fn test_plain_numbers_are_stripped() {
        assert_eq!(parse_market_cap("$1,234"), Some(1234.0));
        assert_eq!(parse_market_cap("987.5"), Some(987.5));
        assert_eq!(parse_market_cap("USD 55"), Some(55.0));
    }

    #[test]
    fn test_empty_and_garbage() {
        assert_eq!(parse_market_cap(""), None);
        assert_eq!(parse_market_cap("n/a"), None);
        // Suffix present but no leading number.
        assert_eq!(parse_market_cap("$4.7K"), None);
        assert_eq!(parse_market_cap("K"), None);
    }

    #[test]
    fn test_lowercase_suffix_is_not_a_multiplier() {
        // "4.7k" takes the plain path: "4.7"
        assert_eq!(parse_market_cap("4.7k"), Some(4.7));
    }

    #[test]
    fn test_leading_float_prefix() {
        assert_eq!(leading_float("1.2.3"), Some(1.2));
        assert_eq!(leading_float("  -3.5abc"), Some(-3.5));
        assert_eq!(leading_float("1e3K"), Some(1000.0));
        assert_eq!(leading_float("1eK"), Some(1.0));
        assert_eq!(leading_float(".5"), Some(0.5));
        assert_eq!(leading_float("."), None);
        assert_eq!(leading_float("-"), None);
    }
}
