//! Display formatting for amounts and percentages.

use crate::value_object::{Money, Percentage};

/// Currency presentation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
    /// Place the symbol after the amount (`1.234,50 €`).
    pub symbol_after: bool,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "$".to_string(),
            thousands_separator: ',',
            decimal_separator: '.',
            symbol_after: false,
        }
    }
}

impl CurrencyFormat {
    pub fn with_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }
}

/// `-$1,234.50` style rendering with exactly two decimals.
pub fn format_currency(amount: Money, format: &CurrencyFormat) -> String {
    let cents = amount.minor().unsigned_abs();
    let whole = group_thousands(cents / 100, format.thousands_separator);
    let number = format!("{whole}{}{:02}", format.decimal_separator, cents % 100);
    let sign = if amount.is_negative() { "-" } else { "" };

    if format.symbol_after {
        format!("{sign}{number} {}", format.symbol)
    } else {
        format!("{sign}{}{number}", format.symbol)
    }
}

/// `12.3%`; non-finite values render as an em dash placeholder.
pub fn format_percentage(value: Percentage, decimals: usize) -> String {
    let v = value.value();
    if !v.is_finite() {
        return "—".to_string();
    }
    // Avoid rendering "-0.0%".
    let rounded = format!("{:.*}", decimals, v);
    if rounded.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        return format!("{}%", rounded.trim_start_matches('-'));
    }
    format!("{rounded}%")
}

/// Like [`format_percentage`] but with an explicit `+` for growth.
pub fn format_signed_percentage(value: Percentage, decimals: usize) -> String {
    let s = format_percentage(value, decimals);
    let shown = s.trim_end_matches('%').parse::<f64>().unwrap_or(0.0);
    if shown > 0.0 {
        format!("+{s}")
    } else {
        s
    }
}

/// Short form for dashboard cards: `950`, `1.2K`, `3.4M`, `1.0B`.
///
/// The suffix is picked after rounding, so `999_950` reads `1.0M`.
pub fn format_compact(amount: Money) -> String {
    const SUFFIXES: [&str; 3] = ["K", "M", "B"];

    let cents = i128::from(amount.minor()).unsigned_abs();
    let units = (cents + 50) / 100;
    if units < 1_000 {
        let sign = if amount.is_negative() && units > 0 { "-" } else { "" };
        return format!("{sign}{units}");
    }

    let sign = if amount.is_negative() { "-" } else { "" };
    // cents in one tenth of the current suffix
    let mut per_tenth: u128 = 10_000;
    let mut tenths = (cents + per_tenth / 2) / per_tenth;
    let mut suffix = 0;
    while tenths >= 10_000 && suffix + 1 < SUFFIXES.len() {
        per_tenth *= 1_000;
        tenths = (cents + per_tenth / 2) / per_tenth;
        suffix += 1;
    }
    format!("{sign}{}.{}{}", tenths / 10, tenths % 10, SUFFIXES[suffix])
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn currency_groups_thousands() {
        let f = CurrencyFormat::default();
        assert_eq!(format_currency(Money::from_minor(123_456_789), &f), "$1,234,567.89");
        assert_eq!(format_currency(Money::from_minor(-123_450), &f), "-$1,234.50");
        assert_eq!(format_currency(Money::from_minor(5), &f), "$0.05");
        assert_eq!(format_currency(Money::ZERO, &f), "$0.00");
    }

    #[test]
    fn currency_symbol_after() {
        let f = CurrencyFormat {
            symbol: "€".into(),
            thousands_separator: '.',
            decimal_separator: ',',
            symbol_after: true,
        };
        assert_eq!(format_currency(Money::from_minor(123_450), &f), "1.234,50 €");
    }

    #[test]
    fn currency_handles_i64_min() {
        let s = format_currency(Money::from_minor(i64::MIN), &CurrencyFormat::default());
        assert_eq!(s, "-$92,233,720,368,547,758.08");
    }

    #[test]
    fn percentage_rounding() {
        assert_eq!(format_percentage(Percentage::new(12.345), 1), "12.3%");
        assert_eq!(format_percentage(Percentage::new(-0.04), 1), "0.0%");
        assert_eq!(format_percentage(Percentage::new(f64::NAN), 1), "—");
        assert_eq!(format_signed_percentage(Percentage::new(8.0), 0), "+8%");
        assert_eq!(format_signed_percentage(Percentage::new(-8.0), 0), "-8%");
        assert_eq!(format_signed_percentage(Percentage::new(0.0), 1), "0.0%");
        assert_eq!(format_signed_percentage(Percentage::new(0.5), 1), "+0.5%");
    }

    #[test]
    fn compact_suffixes() {
        assert_eq!(format_compact(Money::from_major(950)), "950");
        assert_eq!(format_compact(Money::from_major(1_240)), "1.2K");
        assert_eq!(format_compact(Money::from_major(-3_400_000)), "-3.4M");
        assert_eq!(format_compact(Money::from_major(2_000_000_000)), "2.0B");
    }

    #[test]
    fn compact_moves_up_a_suffix_when_rounding_reaches_a_thousand() {
        assert_eq!(format_compact(Money::from_major(999_950)), "1.0M");
        assert_eq!(format_compact(Money::from_major(999_949)), "999.9K");
        assert_eq!(format_compact(Money::from_minor(99_960)), "1.0K");
        assert_eq!(format_compact(Money::from_major(-999_950_000)), "-1.0B");
        assert_eq!(format_compact(Money::from_minor(-10)), "0");
    }

    proptest! {
        #[test]
        fn currency_never_panics_and_keeps_two_decimals(cents in any::<i64>()) {
            let s = format_currency(Money::from_minor(cents), &CurrencyFormat::default());
            let (_, decimals) = s.rsplit_once('.').unwrap();
            prop_assert_eq!(decimals.len(), 2);
        }
    }
}
