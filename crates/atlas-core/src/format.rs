//! Display formatting for dashboard cells.

/// Format an integer with comma thousands separators: `1234567` -> `1,234,567`.
pub fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    format!("{}{}", sign, group_str(&digits))
}

/// Format a float with comma thousands separators, always keeping a
/// fractional part: `9984670.0` -> `9,984,670.0`, `0.44` -> `0.44`.
pub fn group_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let text = value.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "0"));
    let sign = if value.is_sign_negative() && value != 0.0 {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, group_str(int_part), frac_part)
}

/// Escape text for inclusion in HTML or SVG markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn group_str(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
