//! Free-form price string parsing.
//!
//! Backends report prices as display strings in whatever shape the retailer
//! rendered them: `"$599.00"`, `"1,234.56"`, `"19,99 €"`, `"USD 45"`. This
//! module turns those into comparable `f64` values without ever failing:
//! `0.0` is the single "unparseable" sentinel and callers must treat it as
//! "reject this candidate".

/// Parses a free-form price string into a numeric value.
///
/// Rules:
/// 1. Everything except digits, `,`, and `.` is stripped.
/// 2. When both `,` and `.` are present, commas are thousands separators and
///    are removed (`"1,234.56"` → `1234.56`).
/// 3. When only `,` is present, it is a decimal separator iff there is
///    exactly one comma with at most two digits after it (`"19,99"` →
///    `19.99`); otherwise commas are thousands separators (`"1,234"` →
///    `1234.0`).
/// 4. The result must satisfy `0 < value <= ceiling`; anything else returns
///    the `0.0` sentinel.
///
/// Never panics.
#[must_use]
pub fn parse_price(text: &str, ceiling: f64) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return 0.0;
    }

    let has_comma = cleaned.contains(',');
    let has_period = cleaned.contains('.');

    let normalized = if has_comma && has_period {
        cleaned.replace(',', "")
    } else if has_comma {
        if is_decimal_comma(&cleaned) {
            cleaned.replace(',', ".")
        } else {
            cleaned.replace(',', "")
        }
    } else {
        cleaned
    };

    match normalized.parse::<f64>() {
        Ok(value) if value > 0.0 && value <= ceiling => value,
        _ => 0.0,
    }
}

/// `true` when a comma-only string uses the comma as a decimal separator:
/// exactly one comma, with one or two digits after it.
///
/// `"19,99"` → true. `"1,234"` (three digits follow) → false. `"1,234,567"`
/// (two commas) → false.
fn is_decimal_comma(cleaned: &str) -> bool {
    let mut commas = cleaned.match_indices(',');
    let Some((pos, _)) = commas.next() else {
        return false;
    };
    if commas.next().is_some() {
        return false;
    }
    let digits_after = cleaned.len() - pos - 1;
    (1..=2).contains(&digits_after)
}
