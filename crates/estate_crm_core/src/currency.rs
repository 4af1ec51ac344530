//! crates/estate_crm_core/src/currency.rs
//!
//! Display formatting of monetary amounts per currency code.

/// Formats an amount for display. EUR and TND group thousands with spaces,
/// USD and GBP with commas; anything else falls back to the bare
/// comma-grouped digits.
pub fn format_currency(amount: u64, currency: &str) -> String {
    match currency {
        "EUR" => format!("{} €", group_thousands(amount, ' ')),
        "USD" => format!("${}", group_thousands(amount, ',')),
        "GBP" => format!("£{}", group_thousands(amount, ',')),
        "TND" => format!("{} TND", group_thousands(amount, ' ')),
        _ => group_thousands(amount, ','),
    }
}

/// Groups digits in threes: 1234567 -> "1,234,567" or "1 234 567".
fn group_thousands(amount: u64, separator: char) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0, ','), "0");
        assert_eq!(group_thousands(999, ','), "999");
        assert_eq!(group_thousands(1_000, ','), "1,000");
        assert_eq!(group_thousands(850_000, ' '), "850 000");
        assert_eq!(group_thousands(1_234_567, ' '), "1 234 567");
    }

    #[test]
    fn formats_known_currencies() {
        assert_eq!(format_currency(1_234_567, "EUR"), "1 234 567 €");
        assert_eq!(format_currency(850_000, "USD"), "$850,000");
        assert_eq!(format_currency(850_000, "GBP"), "£850,000");
        assert_eq!(format_currency(1_234_567, "TND"), "1 234 567 TND");
        assert_eq!(format_currency(850_000, "CHF"), "850,000");
    }
}
