use std::str::FromStr;

use rust_decimal::Decimal;

/// Local calendar date as `YYYY-MM-DD`.
pub fn today_ymd() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Strips `$`, thousands separators and a trailing ` USD` code.
pub fn clean_price_text(raw: &str) -> String {
    raw.replace('$', "").replace(',', "").replace(" USD", "").trim().to_string()
}

/// `None` when the text is not a non-negative amount.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned = clean_price_text(raw);
    let price = Decimal::from_str(&cleaned).ok()?;
    if price.is_sign_negative() && !price.is_zero() {
        return None;
    }
    Some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::dec;

    #[test]
    fn strips_currency_noise() {
        assert_eq!(clean_price_text("$1,299.00 USD"), "1299.00");
        assert_eq!(clean_price_text(" $25.99 "), "25.99");
    }

    #[test]
    fn parses_store_formats() {
        assert_eq!(parse_price("$25.00"), Some(dec("25")));
        assert_eq!(parse_price("$1,049.95 USD"), Some(dec("1049.95")));
        assert_eq!(parse_price("19.5"), Some(dec("19.50")));
        assert_eq!(parse_price("$0.00"), Some(Decimal::ZERO));
    }

    #[test]
    fn rejects_garbage_and_negatives() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("Sold out"), None);
        assert_eq!(parse_price("From $12"), None);
        assert_eq!(parse_price("-$5.00"), None);
    }

    #[test]
    fn date_has_iso_shape() {
        let d = today_ymd();
        assert_eq!(d.len(), 10);
        assert_eq!(d.as_bytes()[4], b'-');
        assert_eq!(d.as_bytes()[7], b'-');
    }
}
