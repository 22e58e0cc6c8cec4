//! Display formatting. Cosmetic only: nothing downstream parses these strings.

/// `1234567.891` → `$1,234,567.89`
pub fn currency(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u128;
    format!("{}${}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

/// `None` renders as `n/a`.
pub fn optional_currency(value: Option<f64>) -> String {
    value.map(currency).unwrap_or_else(|| "n/a".to_string())
}

/// `1234567` → `1,234,567`
pub fn thousands(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    format!("{}{}", sign, group_thousands(value.unsigned_abs() as u128))
}

/// Two decimals with thousands separators, no currency sign.
pub fn decimal(value: f64) -> String {
    currency(value).replacen('$', "", 1)
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

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

/// JSON text safe to place inside a `<script>` element.
pub fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}
