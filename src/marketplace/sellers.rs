//! Multi-seller resolution.
//!
//! Marketplace search results sometimes carry an aggregate seller label
//! ("در ۵ فروشگاه" / "available at 5 stores") instead of one concrete shop.
//! Those are expanded into up to [`MAX_RESOLVED_SELLERS`] concrete names via
//! the secondary detail lookup before a price record is written.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use serde_json::Value;

use super::client::DetailSource;
use super::types::Candidate;

/// Maximum number of concrete seller names joined into one resolved label.
pub const MAX_RESOLVED_SELLERS: usize = 3;

/// Placeholder when a candidate carries no seller label at all.
pub const UNKNOWN_SELLER: &str = "unknown";

fn aggregate_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)در\s*[0-9\u{06F0}-\u{06F9}\u{0660}-\u{0669}]+\s*فروشگاه|available\s+(?:at|in)\s+[0-9\u{06F0}-\u{06F9}]+\s+stores?",
        )
        .expect("aggregate marker regex")
    })
}

/// Whether a seller label denotes an aggregate "available at N stores"
/// listing rather than one concrete shop.
pub fn is_aggregate_label(label: &str) -> bool {
    aggregate_marker().is_match(label)
}

/// Seller names out of a detail document. The marketplace nests them in an
/// `offers` (sometimes `prices`) array; each entry names its shop under one
/// of a few keys. Names are trimmed at the first comma — the tail is a city
/// or branch qualifier — then deduplicated with input order preserved.
fn extract_seller_names(doc: &Value) -> Vec<String> {
    let offers = ["offers", "prices"]
        .iter()
        .find_map(|k| doc.get(*k).and_then(|v| v.as_array()))
        .cloned()
        .unwrap_or_default();

    let mut names: Vec<String> = Vec::new();
    for offer in &offers {
        let raw = ["seller_name", "store_name", "shop_name"]
            .iter()
            .find_map(|k| offer.get(*k).and_then(|v| v.as_str()));
        let Some(raw) = raw else { continue };

        let head = raw.split(['，', '،', ',']).next().unwrap_or(raw).trim();
        if head.is_empty() || names.iter().any(|n| n == head) {
            continue;
        }
        names.push(head.to_string());
        if names.len() == MAX_RESOLVED_SELLERS {
            break;
        }
    }
    names
}

/// Resolve the seller label to persist for a candidate.
///
/// - no label → [`UNKNOWN_SELLER`]
/// - concrete label → as-is
/// - aggregate label → detail lookup, first 3 distinct shop names joined
///   with ", "; the original label survives when the lookup fails or yields
///   nothing (never fabricate a seller).
pub async fn resolve_seller(candidate: &Candidate, details: &dyn DetailSource) -> String {
    let label = match candidate.seller.as_deref().map(str::trim) {
        Some(l) if !l.is_empty() => l.to_string(),
        _ => return UNKNOWN_SELLER.to_string(),
    };

    if !is_aggregate_label(&label) {
        return label;
    }

    let Some(detail_ref) = candidate.detail.as_ref() else {
        warn!(
            candidate = %candidate.name,
            %label,
            "aggregate seller label without a detail reference; keeping label"
        );
        return label;
    };

    let doc = match details.fetch_detail(detail_ref).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!(
                candidate = %candidate.name,
                %label,
                error = %e,
                "detail lookup failed; keeping aggregate label"
            );
            return label;
        }
    };

    let names = extract_seller_names(&doc);
    if names.is_empty() {
        warn!(
            candidate = %candidate.name,
            %label,
            "detail page yielded no seller names; keeping aggregate label"
        );
        return label;
    }
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;

    use crate::marketplace::types::DetailRef;

    struct StubDetails(Option<Value>);

    #[async_trait]
    impl DetailSource for StubDetails {
        async fn fetch_detail(&self, _detail: &DetailRef) -> Result<Value> {
            self.0.clone().ok_or_else(|| anyhow!("404 Not Found"))
        }
    }

    fn aggregate_candidate(label: &str) -> Candidate {
        Candidate {
            name: "Widget X".into(),
            price: 9500,
            seller: Some(label.into()),
            detail: Some(DetailRef {
                key: "prk-1".into(),
                search_id: "s-1".into(),
            }),
            raw: json!({}),
        }
    }

    #[test]
    fn recognizes_aggregate_labels_in_both_scripts() {
        assert!(is_aggregate_label("در ۵ فروشگاه"));
        assert!(is_aggregate_label("در 12 فروشگاه"));
        assert!(is_aggregate_label("available at 5 stores"));
        assert!(is_aggregate_label("Available in 3 stores"));
        assert!(!is_aggregate_label("ShopA"));
        assert!(!is_aggregate_label("فروشگاه مرکزی"));
    }

    #[tokio::test]
    async fn joins_first_three_distinct_names() {
        let details = StubDetails(Some(json!({
            "offers": [
                { "seller_name": "ShopA" },
                { "seller_name": "ShopB, تهران" },
                { "store_name": "ShopA" },
                { "seller_name": "ShopC" },
                { "seller_name": "ShopD" },
            ]
        })));
        let resolved =
            resolve_seller(&aggregate_candidate("available at 5 stores"), &details).await;
        assert_eq!(resolved, "ShopA, ShopB, ShopC");
    }

    #[tokio::test]
    async fn failed_detail_lookup_keeps_aggregate_label() {
        let details = StubDetails(None);
        let resolved =
            resolve_seller(&aggregate_candidate("available at 3 stores"), &details).await;
        assert_eq!(resolved, "available at 3 stores");
    }

    #[tokio::test]
    async fn empty_offer_list_keeps_aggregate_label() {
        let details = StubDetails(Some(json!({ "offers": [] })));
        let resolved = resolve_seller(&aggregate_candidate("در ۳ فروشگاه"), &details).await;
        assert_eq!(resolved, "در ۳ فروشگاه");
    }

    #[tokio::test]
    async fn concrete_label_passes_through_without_lookup() {
        // A failing detail source proves the lookup is never attempted.
        let details = StubDetails(None);
        let mut c = aggregate_candidate("ShopA");
        c.seller = Some("ShopA".into());
        assert_eq!(resolve_seller(&c, &details).await, "ShopA");
    }

    #[tokio::test]
    async fn missing_label_becomes_unknown() {
        let details = StubDetails(None);
        let mut c = aggregate_candidate("x");
        c.seller = None;
        assert_eq!(resolve_seller(&c, &details).await, UNKNOWN_SELLER);
        c.seller = Some("   ".into());
        assert_eq!(resolve_seller(&c, &details).await, UNKNOWN_SELLER);
    }
}
