//! Field sanitization.
//!
//! Every function here is total and idempotent: it never fails, and feeding
//! its output back in returns the same output.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::ingest::error::RejectReason;
use crate::ingest::submission::RawRow;

pub const TIMESTAMP_MAX_LEN: usize = 64;
pub const ITEM_NAME_MAX_LEN: usize = 96;
pub const QTY_MIN: i64 = 1;
pub const QTY_MAX: i64 = 9999;

pub const CURRENCY: &str = "USD";
pub const IVA_RATE: f64 = 0.15;

/// A row in canonical form. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedRow {
    pub timestamp: String,
    pub item_name: String,
    pub qty: i64,
    pub subtotal_usd: String,
    pub vat_usd: String,
    pub total_usd: String,
    pub currency: &'static str,
    pub iva_rate: f64,
}

/// Sanitize every row, rejecting the whole submission on the first bad one.
pub fn sanitize_rows(rows: Vec<RawRow>) -> Result<Vec<SanitizedRow>, RejectReason> {
    if rows.is_empty() {
        return Err(RejectReason::EmptyRows);
    }
    rows.iter().map(sanitize_row).collect()
}

fn sanitize_row(raw: &RawRow) -> Result<SanitizedRow, RejectReason> {
    let row = SanitizedRow {
        timestamp: safe_text(&raw.timestamp, TIMESTAMP_MAX_LEN),
        item_name: safe_text(&raw.item, ITEM_NAME_MAX_LEN),
        qty: to_int(&raw.qty, QTY_MIN, QTY_MAX),
        subtotal_usd: to_money(&raw.subtotal),
        vat_usd: to_money(&raw.vat),
        total_usd: to_money(&raw.total),
        currency: CURRENCY,
        iva_rate: IVA_RATE,
    };

    if row.timestamp.is_empty() || row.item_name.is_empty() || row.qty <= 0 {
        return Err(RejectReason::InvalidRow {
            item_name: row.item_name,
            qty: row.qty,
        });
    }
    Ok(row)
}

/// Display-safe text. Non-strings become the empty string.
pub fn safe_text(value: &Value, max_len: usize) -> String {
    match value {
        Value::String(s) => clean_text(s, max_len),
        _ => String::new(),
    }
}

/// Drop `<` and `>`, turn each run of ASCII control characters into one
/// space, trim, and cut to `max_len` characters.
pub fn clean_text(raw: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_control_run = false;

    for ch in raw.chars() {
        match ch {
            '<' | '>' => {}
            c if (c as u32) < 0x20 => {
                if !in_control_run {
                    out.push(' ');
                    in_control_run = true;
                }
            }
            c => {
                in_control_run = false;
                out.push(c);
            }
        }
    }

    let cut: String = out.trim().chars().take(max_len).collect();
    // Truncation can expose trailing whitespace.
    cut.trim_end().to_string()
}

/// Integer from the value's string form, clamped into `[min, max]`.
/// Unparsable input counts as 0 before clamping.
pub fn to_int(value: &Value, min: i64, max: i64) -> i64 {
    let parsed = string_form(value)
        .and_then(|s| leading_int(&s))
        .unwrap_or(0);
    parsed.clamp(min, max)
}

/// Non-negative amount with exactly two decimals; anything else is `"0.00"`.
pub fn to_money(value: &Value) -> String {
    match string_form(value).and_then(|s| leading_float(&s)) {
        // Adding 0.0 turns -0.0 into 0.0.
        Some(amount) if amount.is_finite() && amount >= 0.0 => format!("{:.2}", amount + 0.0),
        _ => "0.00".to_string(),
    }
}

fn string_form(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        _ => None,
    }
}

/// Longest leading `[+-]digits` prefix, saturating on overflow.
fn leading_int(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut acc: i64 = 0;
    let mut seen = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        acc = acc.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    seen.then_some(if negative { -acc } else { acc })
}

/// Longest leading decimal number prefix (`1.5`, `.5`, `2e3`, `3abc` → 3).
fn leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits_from(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    s[..end].parse().ok()
}
