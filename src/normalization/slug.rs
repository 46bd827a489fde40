//! Canonical product slug derivation.

/// Slug of a catalog product URL: the tail after the last `/product/`
/// segment, percent-decoded. URLs without the marker fall back to the whole
/// input, so surrogate keys survive unchanged as conflict keys.
pub fn product_slug(url: &str) -> String {
    let tail = match url.rsplit_once("/product/") {
        Some((_, tail)) => tail,
        None => url,
    };
    let tail = tail.trim_end_matches('/');
    match urlencoding::decode(tail) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => tail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_tail_after_product_segment() {
        assert_eq!(
            product_slug("https://shop.example/product/juicer-mega-pro"),
            "juicer-mega-pro"
        );
    }

    #[test]
    fn percent_decodes_non_ascii_slugs() {
        // "تیغ" percent-encoded
        assert_eq!(
            product_slug("https://shop.example/product/%D8%AA%DB%8C%D8%BA-classic"),
            "تیغ-classic"
        );
    }

    #[test]
    fn passes_surrogate_keys_through() {
        assert_eq!(product_slug("sku-10452"), "sku-10452");
    }
}
