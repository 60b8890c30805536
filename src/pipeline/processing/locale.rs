//! Brazilian number conventions: `1.234,56` in, `R$ 1.234,56` out.

use crate::error::ParseError;

const ZERO_BRL: &str = "R$ 0,00";

/// Parse a pt-BR decimal string. Every `.` is a thousands separator and the
/// `,` is the decimal point. Empty, malformed and non-finite values fail.
pub fn parse_br_decimal(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Amount(raw.to_string()));
    }
    let canonical = trimmed.replace('.', "").replace(',', ".");
    canonical
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::Amount(raw.to_string()))
}

/// Render a value as Brazilian currency with two decimals. Missing or
/// non-finite values render as zero.
///
/// Deliberately differs from plain `{:.2}` rendering for tiny negatives:
/// anything that rounds to zero prints `R$ 0,00`, never `R$ -0,00`.
pub fn format_brl(value: Option<f64>) -> String {
    let value = match value {
        Some(v) if v.is_finite() => v,
        _ => return ZERO_BRL.to_string(),
    };

    let rendered = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));
    let negative = value < 0.0 && rendered != "0.00";

    format!(
        "R$ {}{},{}",
        if negative { "-" } else { "" },
        group_thousands(int_part),
        frac_part
    )
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
