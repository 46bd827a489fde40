//! Core data types plus the normalization boundary for raw marketplace JSON.
//!
//! Marketplace responses are duck-typed upstream; nothing past this module
//! ever touches a `serde_json::Value` field access for scoring decisions.
//! Malformed entries become `None` here (candidate unusable), not a panic in
//! the scoring core.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalization::digits::parse_price;
use crate::normalization::slug::product_slug;

/// A locally crawled catalog product. Created/updated by the crawl step;
/// read-only to the matching core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub url: String,
    pub name: String,
    /// Smallest currency unit.
    pub price: i64,
}

impl Product {
    pub fn slug(&self) -> String {
        product_slug(&self.url)
    }
}

/// Identifier pair for the follow-up detail lookup of a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRef {
    pub key: String,
    pub search_id: String,
}

/// One raw marketplace search result. Ephemeral: sourced fresh per matching
/// run, never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub price: i64,
    /// Concrete seller name, or an aggregate "available at N stores" label.
    pub seller: Option<String>,
    pub detail: Option<DetailRef>,
    /// Verbatim payload, kept for the review audit trail.
    pub raw: Value,
}

fn string_field(item: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = item.get(*key).and_then(|v| v.as_str()) {
            let s = s.trim();
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
}

/// Price fields arrive as numbers or decorated strings depending on the
/// endpoint; both coerce to an integer, 0 on failure.
pub fn coerce_price(v: Option<&Value>) -> i64 {
    match v {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Some(Value::String(s)) => parse_price(s),
        _ => 0,
    }
}

impl Candidate {
    /// Normalize one search-result entry. Returns `None` when the entry has
    /// no usable display name; everything else degrades field by field.
    pub fn from_search_result(item: &Value) -> Option<Self> {
        let name = string_field(item, &["name1", "name", "title"])?;
        let price = coerce_price(item.get("price"));
        let seller = string_field(item, &["seller_name", "shop_text", "shop_name"]);
        let detail = match (
            string_field(item, &["prk"]),
            string_field(item, &["search_id"]),
        ) {
            (Some(key), Some(search_id)) => Some(DetailRef { key, search_id }),
            _ => None,
        };

        Some(Self {
            name,
            price,
            seller,
            detail,
            raw: item.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_full_search_result() {
        let item = json!({
            "name1": "Green Lion MEGA PRO Juicer",
            "price": 245_000,
            "shop_text": "در ۵ فروشگاه",
            "prk": "abc123",
            "search_id": "s-9"
        });
        let c = Candidate::from_search_result(&item).unwrap();
        assert_eq!(c.name, "Green Lion MEGA PRO Juicer");
        assert_eq!(c.price, 245_000);
        assert_eq!(c.seller.as_deref(), Some("در ۵ فروشگاه"));
        assert_eq!(
            c.detail,
            Some(DetailRef {
                key: "abc123".into(),
                search_id: "s-9".into()
            })
        );
        assert_eq!(c.raw, item);
    }

    #[test]
    fn entry_without_a_name_is_unusable() {
        assert!(Candidate::from_search_result(&json!({ "price": 100 })).is_none());
        assert!(Candidate::from_search_result(&json!({ "name1": "  " })).is_none());
    }

    #[test]
    fn price_coercion_defaults_to_zero() {
        let c = Candidate::from_search_result(&json!({
            "name": "Razor Classic",
            "price": "ناموجود"
        }))
        .unwrap();
        assert_eq!(c.price, 0);

        let c = Candidate::from_search_result(&json!({ "name": "Razor Classic" })).unwrap();
        assert_eq!(c.price, 0);
    }

    #[test]
    fn string_prices_pass_through_numeral_normalization() {
        let c = Candidate::from_search_result(&json!({
            "name": "Razor Classic",
            "price": "۱۲۰,۰۰۰"
        }))
        .unwrap();
        assert_eq!(c.price, 120_000);
    }
}
