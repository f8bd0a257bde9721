const EXCERPT_MAX_CHARS: usize = 256;

pub fn mask_secret(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    let len = trimmed.chars().count();
    format!("<redacted len={}>", len)
}

/// Shortens provider bodies before they end up in errors or logs.
pub fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= EXCERPT_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(EXCERPT_MAX_CHARS).collect();
    out.push_str("...");
    out
}

/// Percent with one decimal: `0.8234` → `82.3`.
pub fn percent_one_decimal(score: f64) -> f64 {
    round_tenth(score * 100.0)
}

/// Rounds the exact binary value to one decimal, ties to even.
pub fn round_tenth(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.1}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_secret_hides_value() {
        assert_eq!(mask_secret("abcd"), "<redacted len=4>");
        assert_eq!(mask_secret(" "), "<empty>");
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(1000);
        let out = excerpt(&long);
        assert_eq!(out.chars().count(), EXCERPT_MAX_CHARS + 3);
        assert!(out.ends_with("..."));
        assert_eq!(excerpt(" short "), "short");
    }

    /// `(score, percent)` with the percent correctly rounded from the exact
    /// binary value of `score * 100`.
    const PERCENT_CASES: &[(f64, f64)] = &[
        (0.0115, 1.1),
        (0.0125, 1.2),
        (0.0135, 1.4),
        (0.0145, 1.5),
        (0.0005, 0.1),
        (0.00015, 0.0),
        (0.12345, 12.3),
        (0.12351, 12.4),
        (0.2865, 28.6),
        (0.285, 28.5),
        (0.3355, 33.6),
        (0.575, 57.5),
        (0.8234, 82.3),
        (0.995, 99.5),
        (0.9995, 100.0),
        (0.07, 7.0),
        (0.82, 82.0),
        (0.10, 10.0),
        (1.0, 100.0),
        (0.0, 0.0),
    ];

    #[test]
    fn percent_matches_reference_rounding() {
        for &(score, expected) in PERCENT_CASES {
            assert_eq!(percent_one_decimal(score), expected, "score {score}");
        }
    }

    #[test]
    fn exact_ties_round_to_even() {
        assert_eq!(round_tenth(1.25), 1.2);
        assert_eq!(round_tenth(1.75), 1.8);
        assert_eq!(round_tenth(-1.25), -1.2);
    }

    #[test]
    fn round_tenth_is_idempotent() {
        for &(_, expected) in PERCENT_CASES {
            assert_eq!(round_tenth(expected), expected);
        }
        assert!(round_tenth(f64::NAN).is_nan());
    }
}
