//! Human-readable rendering of large money amounts

const INR_SYMBOL: &str = "₹";

const INR_SCALES: &[(f64, &str)] = &[(10_000_000.0, "Cr"), (100_000.0, "L")];

const GENERIC_SCALES: &[(f64, &str)] = &[
    (1_000_000_000_000.0, "T"),
    (1_000_000_000.0, "B"),
    (1_000_000.0, "M"),
];

/// Abbreviate `value` using crore/lakh for rupees and T/B/M for everything
/// else. Thresholds are inclusive. The currency symbol only selects the
/// convention; it is not part of the output.
pub fn format_magnitude(value: Option<f64>, currency_symbol: &str) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };

    let scales = if currency_symbol == INR_SYMBOL {
        INR_SCALES
    } else {
        GENERIC_SCALES
    };

    scales
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map(|(threshold, suffix)| format!("{:.2}{suffix}", value / threshold))
        .unwrap_or_else(|| format!("{value:.2}"))
}

/// `$` prefix plus the abbreviated figure, or a bare "N/A"
pub fn format_money(value: Option<f64>, currency_symbol: &str) -> String {
    match value {
        Some(_) => format!("{currency_symbol}{}", format_magnitude(value, currency_symbol)),
        None => "N/A".to_string(),
    }
}

pub fn format_decimal(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

/// Signed percentage, e.g. "+12.34%"
pub fn format_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:+.2}%"))
}

/// Price with currency symbol and two decimals, not abbreviated
pub fn format_price(value: Option<f64>, currency_symbol: &str) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{currency_symbol}{v:.2}"))
}
