//! Lifetime parsing in Go duration syntax (`168h`, `1h30m`, `1.5s`, `300ms`).

use crate::error::AppError;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 60 * 60 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

fn invalid(input: &str, reason: &str) -> AppError {
    AppError::BadRequest(format!("invalid lifetime '{}': {}", input, reason))
}

fn split_digits(value: &str) -> (&str, &str) {
    let end = value
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(value.len());
    value.split_at(end)
}

/// Parse a lifetime such as `168h` or `1h30m`.
///
/// Accepts an optional sign followed by one or more `<number><unit>` terms,
/// where the number may carry a decimal fraction and the unit is one of
/// `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`. A bare `0` is accepted, and a
/// well-formed negative value clamps to zero.
///
/// # Arguments
/// - `input`: Duration string, usually taken from a request header.
///
/// # Returns
/// The parsed [`Duration`].
///
/// # Errors
/// Returns [`AppError::BadRequest`] for malformed input, unknown units, or
/// values that overflow a [`Duration`].
pub fn parse_lifetime(input: &str) -> Result<Duration, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid(input, "empty value"));
    }

    let (negative, mut rest) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid(input, "missing value"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole_digits, after_whole) = split_digits(rest);
        let (fraction_digits, after_number) = match after_whole.strip_prefix('.') {
            Some(fraction) => split_digits(fraction),
            None => ("", after_whole),
        };
        if whole_digits.is_empty() && fraction_digits.is_empty() {
            return Err(invalid(input, "expected a number"));
        }

        let unit_end = after_number
            .find(|ch: char| ch.is_ascii_digit() || ch == '.')
            .unwrap_or(after_number.len());
        let (unit, next) = after_number.split_at(unit_end);
        if unit.is_empty() {
            return Err(invalid(input, "missing unit"));
        }
        let scale = unit_nanos(unit).ok_or_else(|| invalid(input, "unknown unit"))?;

        let whole: u128 = if whole_digits.is_empty() {
            0
        } else {
            whole_digits
                .parse()
                .map_err(|_| invalid(input, "value out of range"))?
        };
        let mut term = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid(input, "value out of range"))?;

        let mut digit_scale = scale;
        for digit in fraction_digits.bytes() {
            digit_scale /= 10;
            if digit_scale == 0 {
                break;
            }
            term = term
                .checked_add(u128::from(digit - b'0') * digit_scale)
                .ok_or_else(|| invalid(input, "value out of range"))?;
        }

        total = total
            .checked_add(term)
            .ok_or_else(|| invalid(input, "value out of range"))?;
        rest = next;
    }

    // A negative lifetime has already elapsed.
    if negative {
        return Ok(Duration::ZERO);
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| invalid(input, "value out of range"))?;
    // remainder is always below one second
    let nanos = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, nanos))
}

#[cfg(test)]
mod tests {
    use super::parse_lifetime;
    use crate::AppError;
    use std::time::Duration;

    #[test]
    fn parses_single_and_compound_terms() {
        let cases = [
            ("168h", Duration::from_secs(168 * 3600)),
            ("1h30m", Duration::from_secs(5400)),
            ("1.5s", Duration::from_millis(1500)),
            ("300ms", Duration::from_millis(300)),
            ("2us", Duration::from_micros(2)),
            ("2µs", Duration::from_micros(2)),
            ("15ns", Duration::from_nanos(15)),
            ("+5m", Duration::from_secs(300)),
            (".5h", Duration::from_secs(1800)),
            ("1h0m10s", Duration::from_secs(3610)),
            (" 10s ", Duration::from_secs(10)),
        ];
        for (input, expected) in cases {
            let parsed = parse_lifetime(input).expect("valid lifetime");
            assert_eq!(parsed, expected, "input: {}", input);
        }
    }

    #[test]
    fn bare_zero_is_accepted() {
        assert_eq!(parse_lifetime("0").expect("zero"), Duration::ZERO);
        assert_eq!(parse_lifetime("-0").expect("signed zero"), Duration::ZERO);
        assert_eq!(parse_lifetime("0s").expect("zero seconds"), Duration::ZERO);
    }

    #[test]
    fn rejects_malformed_values() {
        for input in ["", "abc", "10", "5x", "1..5s", ".s", "h", "-", "1h-5m"] {
            let result = parse_lifetime(input);
            assert!(
                matches!(result, Err(AppError::BadRequest(_))),
                "input should be rejected: {:?}",
                input
            );
        }
    }

    #[test]
    fn negative_lifetimes_clamp_to_zero() {
        assert_eq!(parse_lifetime("-1h").expect("negative"), Duration::ZERO);
        assert_eq!(parse_lifetime("-1.5s").expect("negative"), Duration::ZERO);
        assert!(matches!(
            parse_lifetime("-1x"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_overflowing_values() {
        for input in [
            "99999999999999999999999999999999999999999h",
            "340282366920938463463374607431768211.9us",
            "18446744073709551616s",
        ] {
            let result = parse_lifetime(input);
            assert!(
                matches!(result, Err(AppError::BadRequest(_))),
                "input should be rejected: {:?}",
                input
            );
        }
    }
}
