// Formatting of minor-unit amounts for log lines

const ZERO_DECIMAL: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

const THREE_DECIMAL: &[&str] = &["bhd", "jod", "kwd", "omr", "tnd"];

/// Number of minor-unit digits for an ISO currency code (case-insensitive).
pub fn minor_unit_digits(currency: &str) -> u32 {
    let code = currency.trim().to_ascii_lowercase();
    if ZERO_DECIMAL.contains(&code.as_str()) {
        0
    } else if THREE_DECIMAL.contains(&code.as_str()) {
        3
    } else {
        2
    }
}

/// `2000, "usd"` becomes `"20.00 USD"`; `500, "jpy"` becomes `"500 JPY"`.
pub fn format_amount(amount: i64, currency: &str) -> String {
    let code = currency.trim().to_ascii_uppercase();
    let digits = minor_unit_digits(currency);
    if digits == 0 {
        return format!("{amount} {code}");
    }

    let scale = 10u64.pow(digits);
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!(
        "{sign}{}.{:0width$} {code}",
        abs / scale,
        abs % scale,
        width = digits as usize
    )
}
