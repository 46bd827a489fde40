//! Numeral normalization for prices coming out of Persian-language catalogs.
//!
//! Marketplace and crawler payloads mix ASCII digits, Eastern Arabic digits
//! and Persian digits, often wrapped in separators and a currency word
//! ("۲۵۰,۰۰۰ تومان"). Everything funnels through here before a price is
//! treated as a number.

/// Translate Persian (U+06F0..U+06F9) and Eastern Arabic (U+0660..U+0669)
/// digits to their ASCII equivalents. All other characters pass through.
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{06F0}'..='\u{06F9}' => {
                char::from(b'0' + (c as u32 - 0x06F0) as u8)
            }
            '\u{0660}'..='\u{0669}' => {
                char::from(b'0' + (c as u32 - 0x0660) as u8)
            }
            _ => c,
        })
        .collect()
}

/// Extract an integer price (smallest currency unit) from a decorated string.
/// Non-digit characters are stripped after numeral normalization; an input
/// with no digits at all coerces to 0.
pub fn parse_price(raw: &str) -> i64 {
    let digits: String = normalize_digits(raw)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<i64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_persian_digits() {
        assert_eq!(normalize_digits("۲۵۰٬۰۰۰"), "250٬000");
        assert_eq!(normalize_digits("٤٢"), "42");
    }

    #[test]
    fn parses_decorated_price_strings() {
        assert_eq!(parse_price("۲۵۰,۰۰۰ تومان"), 250_000);
        assert_eq!(parse_price("1,299,000"), 1_299_000);
    }

    #[test]
    fn coerces_garbage_to_zero() {
        assert_eq!(parse_price("تماس بگیرید"), 0);
        assert_eq!(parse_price(""), 0);
    }
}
