//! Display-string formatting for currency amounts and percentage changes.
//! Pure functions, no state, no I/O.

use crate::market::Currency;

const ABSENT: &str = "—";

/// Fraction digits scale with magnitude so sub-unit coin prices keep
/// enough precision: |v| >= 1 gets up to 2, |v| >= 0.01 up to 4, else 6.
fn max_fraction_digits(value: f64) -> usize {
    if value.is_nan() {
        0
    } else if value.abs() >= 1.0 {
        2
    } else if value.abs() >= 0.01 {
        4
    } else {
        6
    }
}

/// en-US style grouping with trailing fraction zeros trimmed.
fn grouped(value: f64, max_digits: usize) -> String {
    let negative = value < 0.0;
    let rendered = format!("{:.*}", max_digits, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (rendered.as_str(), ""),
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Formats a monetary amount in the given quote currency, e.g. `$50,000`
/// or `1.25 SOL`. Absent values render as a dash.
pub fn currency(value: Option<f64>, currency: Currency) -> String {
    let Some(value) = value else {
        return ABSENT.to_string();
    };
    let amount = grouped(value, max_fraction_digits(value));
    match currency {
        Currency::Usd => format!("${amount}"),
        Currency::Eur => format!("€{amount}"),
        Currency::Idr => format!("Rp{amount}"),
        // No ISO symbol for a crypto quote; fall back to a code suffix.
        Currency::Sol => format!("{amount} SOL"),
    }
}

/// Formats a percentage change with a fixed two fraction digits and an
/// explicit sign for positive values, e.g. `+2.50%`.
pub fn percentage(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => {
            let sign = if v > 0.0 { "+" } else { "" };
            format!("{sign}{v:.2}%")
        }
        _ => ABSENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands_and_trims_zeros() {
        assert_eq!(currency(Some(50000.0), Currency::Usd), "$50,000");
        assert_eq!(currency(Some(1234567.5), Currency::Usd), "$1,234,567.5");
        assert_eq!(currency(Some(2.5), Currency::Eur), "€2.5");
    }

    #[test]
    fn currency_precision_scales_with_magnitude() {
        assert_eq!(currency(Some(0.1234), Currency::Usd), "$0.1234");
        assert_eq!(currency(Some(0.001234), Currency::Usd), "$0.001234");
        // Rounded at 2 digits once at or above one unit.
        assert_eq!(currency(Some(1.999), Currency::Usd), "$2");
    }

    #[test]
    fn sol_renders_as_suffix() {
        assert_eq!(currency(Some(1.25), Currency::Sol), "1.25 SOL");
    }

    #[test]
    fn idr_uses_rp_prefix() {
        assert_eq!(currency(Some(16250.0), Currency::Idr), "Rp16,250");
    }

    #[test]
    fn negative_amounts_keep_grouping() {
        assert_eq!(currency(Some(-1234.5), Currency::Usd), "$-1,234.5");
    }

    #[test]
    fn absent_values_render_as_dash() {
        assert_eq!(currency(None, Currency::Usd), "—");
        assert_eq!(percentage(None), "—");
        assert_eq!(percentage(Some(f64::NAN)), "—");
    }

    #[test]
    fn percentage_signs_and_digits() {
        assert_eq!(percentage(Some(2.5)), "+2.50%");
        assert_eq!(percentage(Some(-1.0)), "-1.00%");
        assert_eq!(percentage(Some(0.0)), "0.00%");
    }
}
