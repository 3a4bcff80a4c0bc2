//! Text formatting for values printed on the invoice.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Formats an amount as US currency with thousands separators, e.g. `$1,234.50`.
pub fn currency(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}${}.{:02}",
        group_thousands(cents / 100),
        cents % 100
    )
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats a quantity, dropping the fractional part for whole numbers.
pub fn quantity(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Formats a date string as `M/D/YYYY`.
///
/// Accepts plain dates, RFC 3339 timestamps and naive timestamps.  Values that
/// do not parse are returned unchanged so the information is not lost.
pub fn date(raw: &str) -> String {
    let trimmed = raw.trim();
    match parse_date(trimmed) {
        Some(date) => format!("{}/{}/{}", date.month(), date.day(), date.year()),
        None => trimmed.to_owned(),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|timestamp| timestamp.date())
}

/// Upper-cases an invoice status for display.
pub fn status(value: &str) -> String {
    value.trim().to_uppercase()
}

/// File name used when persisting an invoice.
///
/// Path separators are replaced so the name always stays inside the target
/// directory.
pub fn file_name(invoice_number: Option<&str>) -> String {
    let number = invoice_number
        .map(str::trim)
        .filter(|number| !number.is_empty())
        .unwrap_or("Draft");
    let safe: String = number
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '\0' => '-',
            other => other,
        })
        .collect();
    format!("Invoice-{safe}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(currency(0.0), "$0.00");
        assert_eq!(currency(110.0), "$110.00");
        assert_eq!(currency(1234.5), "$1,234.50");
        assert_eq!(currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(currency(-5.0), "-$5.00");
        assert_eq!(currency(-0.001), "$0.00");
    }

    #[test]
    fn currency_rounds_to_cents() {
        assert_eq!(currency(10.006), "$10.01");
        assert_eq!(currency(99.994), "$99.99");
        assert_eq!(currency(f64::NAN), "$0.00");
    }

    #[test]
    fn quantities_drop_trailing_zeroes() {
        assert_eq!(quantity(2.0), "2");
        assert_eq!(quantity(2.5), "2.5");
        assert_eq!(quantity(0.0), "0");
    }

    #[test]
    fn dates_render_month_day_year() {
        assert_eq!(date("2026-01-18"), "1/18/2026");
        assert_eq!(date("2026-01-18T09:30:00Z"), "1/18/2026");
        assert_eq!(date("2026-03-05T09:30:00.250"), "3/5/2026");
        assert_eq!(date("next tuesday"), "next tuesday");
    }

    #[test]
    fn file_names_fall_back_to_draft() {
        assert_eq!(file_name(Some("INV-1001")), "Invoice-INV-1001.pdf");
        assert_eq!(file_name(None), "Invoice-Draft.pdf");
        assert_eq!(file_name(Some("  ")), "Invoice-Draft.pdf");
        assert_eq!(file_name(Some("2026/04")), "Invoice-2026-04.pdf");
    }
}
