//! es-MX amount formatting.
//!
//! Mirrors `Number.toLocaleString('es-MX')`: the integer part is grouped
//! with commas, the fraction is rounded to at most 3 digits, and trailing
//! fraction zeros are dropped (`1500` → `1,500`, `1500.5` → `1,500.5`,
//! `2.3456` → `2.346`).

/// Format an amount the way confirmation messages display it.
#[must_use]
pub fn format_mxn(amount: f64) -> String {
    let negative = amount < 0.0;
    // `{:.3}` rounds half-away-from-zero, matching the locale output.
    let fixed = format!("{:.3}", amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let grouped = group_thousands(int_part);
    let mut out = String::new();
    if negative && (grouped != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Insert comma separators into a plain digit string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
