/// Number handling for catalog cells: the currency-agnostic amount parser,
/// the pt-BR amount renderer, decimal coercion for rule checks, and
/// reversal of scientific-notation corruption.
///
/// None of these functions fail loudly. Unparsable input yields `None` and the
/// caller decides whether to leave the value untouched or report it.
use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Regex statics
//
// Patterns are string literals; the "a^" fallback never matches and only
// exists because the workspace bans expect() and unwrap().
// ---------------------------------------------------------------------------

/// Currency marker, any case.
static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)R\$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken"))
    })
});

/// A spreadsheet-mangled identifier such as `7,89123E+12`.
static SCIENTIFIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+([.,]\d+)?E\+\d+$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken"))
    })
});

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Parses a monetary amount written in either pt-BR or en-US convention.
///
/// The `R$` marker and all whitespace are removed, then everything except
/// digits, `.`, `,` and `-`. Separator resolution:
///
/// - both `.` and `,` present: the rightmost one is the decimal separator;
/// - only `,`: decimal comma, any dots are thousands separators;
/// - only `.`: decimal point when exactly two digits follow the first dot,
///   otherwise every dot is a thousands separator.
///
/// Returns `None` when no digits remain or the result is not a finite number.
///
/// ```
/// use nfkit_core::number::parse_amount;
///
/// assert_eq!(parse_amount("R$ 1.234,56"), Some(1234.56));
/// assert_eq!(parse_amount("1,234.56"), Some(1234.56));
/// assert_eq!(parse_amount("1.234"), Some(1234.0));
/// assert_eq!(parse_amount("abc"), None);
/// ```
pub fn parse_amount(input: &str) -> Option<f64> {
    let without_marker = CURRENCY_RE.replace_all(input, "");
    let cleaned: String = without_marker
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replacen(',', ".", 1),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace('.', "").replacen(',', ".", 1),
        (Some(_), None) => {
            let fraction = cleaned.split('.').nth(1).unwrap_or("");
            if fraction.len() == 2 {
                cleaned
            } else {
                cleaned.replace('.', "")
            }
        }
        (None, None) => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Renders an amount as `1234,56`: comma decimal, two fraction digits, no
/// thousands grouping and no currency symbol.
pub fn render_amount(value: f64) -> String {
    format!("{value:.2}").replacen('.', ",", 1)
}

// ---------------------------------------------------------------------------
// Rule coercion
// ---------------------------------------------------------------------------

/// Coerces trimmed cell text to a number for `Required` and `Min` checks.
///
/// Accepts a plain decimal (`0.0165`, `-3`, `1e3`) or a single decimal comma
/// with no dot (`0,0165`), since corrected rate columns use comma decimals.
/// Returns `None` for blank text, words such as `inf`/`NaN`, or anything else
/// that does not read as a finite number.
pub fn coerce_decimal(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty()
        || t
            .chars()
            .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'))
    {
        return None;
    }

    let parsed = t.parse::<f64>().ok().or_else(|| {
        let single_comma = t.matches(',').count() == 1 && !t.contains('.');
        if single_comma {
            t.replacen(',', ".", 1).parse::<f64>().ok()
        } else {
            None
        }
    });
    parsed.filter(|n| n.is_finite())
}

// ---------------------------------------------------------------------------
// Scientific notation
// ---------------------------------------------------------------------------

/// Reverses a spreadsheet's scientific-notation rendering of a long integer
/// (`7,89123E+12` → `7891230000000`).
///
/// Returns `None` when `text` is not in that shape.
pub fn reverse_scientific(text: &str) -> Option<String> {
    if !SCIENTIFIC_RE.is_match(text) {
        return None;
    }
    let value = text.replacen(',', ".", 1).parse::<f64>().ok()?;
    value.is_finite().then(|| format!("{value:.0}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pt_br_amounts() {
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("R$ 10,00"), Some(10.0));
        assert_eq!(parse_amount("r$10,5"), Some(10.5));
        assert_eq!(parse_amount("1.234.567,89"), Some(1_234_567.89));
    }

    #[test]
    fn parses_en_us_amounts() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("10.50"), Some(10.5));
    }

    #[test]
    fn dot_only_with_other_fraction_width_is_thousands() {
        assert_eq!(parse_amount("1.234"), Some(1234.0));
        assert_eq!(parse_amount("10.5"), Some(105.0));
        assert_eq!(parse_amount("1.234.567"), Some(1_234_567.0));
    }

    #[test]
    fn unparsable_amounts_are_none_not_zero() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("R$"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("1,2,3"), None);
        assert_eq!(parse_amount("1-2"), None);
    }

    #[test]
    fn negative_amounts_parse() {
        assert_eq!(parse_amount("-5,00"), Some(-5.0));
    }

    #[test]
    fn renders_comma_decimal() {
        assert_eq!(render_amount(10.0), "10,00");
        assert_eq!(render_amount(10.5), "10,50");
        assert_eq!(render_amount(1234.56), "1234,56");
    }

    #[test]
    fn coerce_accepts_point_and_single_comma() {
        assert_eq!(coerce_decimal("0.0165"), Some(0.0165));
        assert_eq!(coerce_decimal(" 0,0165 "), Some(0.0165));
        assert_eq!(coerce_decimal("01"), Some(1.0));
        assert_eq!(coerce_decimal("0,00"), Some(0.0));
    }

    #[test]
    fn coerce_rejects_non_numbers() {
        assert_eq!(coerce_decimal(""), None);
        assert_eq!(coerce_decimal("abc"), None);
        assert_eq!(coerce_decimal("inf"), None);
        assert_eq!(coerce_decimal("NaN"), None);
        assert_eq!(coerce_decimal("1.234,56"), None);
        assert_eq!(coerce_decimal("1,2,3"), None);
    }

    #[test]
    fn scientific_notation_is_reversed() {
        assert_eq!(
            reverse_scientific("7,89123E+12").as_deref(),
            Some("7891230000000")
        );
        assert_eq!(reverse_scientific("1.5e+3").as_deref(), Some("1500"));
        assert_eq!(reverse_scientific("7891234567890"), None);
        assert_eq!(reverse_scientific("abcE+12"), None);
    }
}
