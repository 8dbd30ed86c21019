// 💰 Price Formatting
// Human-readable renderings of predicted prices

/// Round to 2 decimal places (prices and per-sqm figures are reported in
/// currency cents precision).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 4 decimal places (model fit scores).
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Full-precision rendering with thousands separators, e.g. `1,000,000`.
/// Rounds half-up to the nearest whole unit first.
pub fn format_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let whole = value.abs().round() as u64;

    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    if negative {
        format!("-{}", out)
    } else {
        out
    }
}

/// Compact magnitude-abbreviated rendering:
/// `999` → "999", `1500` → "2K", `1_250_000` → "1.25M", `12_500_000` → "12.5M".
/// Thousands round half-up to the nearest integer thousand.
pub fn format_compact(value: f64) -> String {
    if value >= 1_000_000.0 {
        format_millions(value)
    } else if value >= 1_000.0 {
        format!("{}K", (value / 1_000.0).round() as i64)
    } else {
        format!("{}", value.round() as i64)
    }
}

fn format_millions(value: f64) -> String {
    let millions = value / 1_000_000.0;
    if millions >= 10.0 {
        format!("{:.1}M", millions)
    } else {
        format!("{:.2}M", millions)
    }
}

/// Render a price interval with both bounds in the scale of the upper
/// bound, so [900_000, 1_100_000] reads "0.90M - 1.10M" rather than
/// mixing "900K" with "1.10M".
pub fn format_range(lower: f64, upper: f64) -> String {
    if upper >= 1_000_000.0 {
        format!("{} - {}", format_millions(lower), format_millions(upper))
    } else if upper >= 1_000.0 {
        format!(
            "{}K - {}K",
            (lower / 1_000.0).round() as i64,
            (upper / 1_000.0).round() as i64
        )
    } else {
        format!("{} - {}", lower.round() as i64, upper.round() as i64)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(10000.456), 10000.46);
        assert_eq!(round2(123.454), 123.45);
        assert_eq!(round2(123.456), 123.46);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(1_000_000.0), "1,000,000");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1_234_567.4), "1,234,567");
        assert_eq!(format_thousands(1_234_567.6), "1,234,568");
        assert_eq!(format_thousands(0.0), "0");
    }

    #[test]
    fn test_format_compact_bare_integers() {
        assert_eq!(format_compact(999.0), "999");
        assert_eq!(format_compact(0.0), "0");
    }

    #[test]
    fn test_format_compact_thousands_rounds_half_up() {
        assert_eq!(format_compact(1_500.0), "2K");
        assert_eq!(format_compact(2_500.0), "3K");
        assert_eq!(format_compact(1_499.0), "1K");
        assert_eq!(format_compact(950_000.0), "950K");
    }

    #[test]
    fn test_format_compact_millions() {
        assert_eq!(format_compact(1_250_000.0), "1.25M");
        assert_eq!(format_compact(12_500_000.0), "12.5M");
        assert_eq!(format_compact(1_000_000.0), "1.00M");
        assert_eq!(format_compact(9_990_000.0), "9.99M");
    }

    #[test]
    fn test_format_range_uses_upper_bound_scale() {
        // A ±10% range around 1M keeps both bounds in millions.
        assert_eq!(format_range(900_000.0, 1_100_000.0), "0.90M - 1.10M");
        assert_eq!(format_range(450_000.0, 550_000.0), "450K - 550K");
        assert_eq!(format_range(720.0, 880.0), "720 - 880");
    }
}
