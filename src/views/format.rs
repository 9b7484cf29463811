//! Number and percentage formatting shared by every view.

/// Sign class of a percentage cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Positive,
    Negative,
}

/// Format a price, volume or market cap.
///
/// - missing, zero or NaN: `0.00`
/// - at least one billion / million: `2.50B` / `3.10M`
/// - below 1: eight decimals
/// - anything else: two decimals with thousands separators
pub fn format_number(value: Option<f64>) -> String {
    let n = match value {
        Some(n) if n != 0.0 && !n.is_nan() => n,
        _ => return "0.00".to_string(),
    };

    if n >= 1e9 {
        format!("{:.2}B", n / 1e9)
    } else if n >= 1e6 {
        format!("{:.2}M", n / 1e6)
    } else if n < 1.0 {
        format!("{:.8}", n)
    } else {
        group_thousands(&format!("{:.2}", n))
    }
}

/// `$` prefixed [`format_number`].
pub fn format_usd(value: Option<f64>) -> String {
    format!("${}", format_number(value))
}

/// Two decimals plus `%`, with the trend class. Missing values read as zero.
pub fn format_percent(value: Option<f64>) -> (String, Trend) {
    let n = value.filter(|n| !n.is_nan()).unwrap_or(0.0);
    let trend = if n >= 0.0 { Trend::Positive } else { Trend::Negative };
    if n == 0.0 {
        return ("0.00%".to_string(), Trend::Positive);
    }
    (format!("{:.2}%", n), trend)
}

// "1234567.89" -> "1,234,567.89"
fn group_thousands(fixed: &str) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}
