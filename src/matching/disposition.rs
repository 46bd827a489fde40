//! Disposition policy: accept the best match silently or route it to the
//! human review queue.
//!
//! This is a two-outcome classifier, not a gate. A sub-threshold rank-1
//! score produces an advisory ReviewItem; reconciliation of the top
//! candidates proceeds either way, so a weak-but-real price is never
//! silently dropped.

use chrono::Utc;
use uuid::Uuid;

use crate::database_ops::store::ReviewItem;
use crate::marketplace::sellers::UNKNOWN_SELLER;
use crate::marketplace::types::Product;

use super::rank::ScoredCandidate;

/// Rank-1 combined scores below this enqueue a review item. The boundary is
/// inclusive on the accept side: exactly 0.5 needs no review.
pub const REVIEW_THRESHOLD: f64 = 0.5;

/// Inspect the ranked pool for one product. Returns the ReviewItem to
/// enqueue, if any: empty pool → nothing; rank-1 at or above the threshold →
/// nothing; otherwise exactly one item built from the rank-1 candidate.
pub fn dispose(product: &Product, ranked: &[ScoredCandidate]) -> Option<ReviewItem> {
    let top = ranked.first()?;
    if top.combined >= REVIEW_THRESHOLD {
        return None;
    }
    Some(ReviewItem {
        id: Uuid::new_v4(),
        product_slug: product.slug(),
        candidate_name: top.candidate.name.clone(),
        candidate_shop: top
            .candidate
            .seller
            .clone()
            .unwrap_or_else(|| UNKNOWN_SELLER.to_string()),
        fuzzy_score: top.lexical,
        semantic_score: top.semantic.value(),
        raw_payload: top.candidate.raw.clone(),
        status: "pending".to_string(),
        queued_at: Utc::now(),
    })
}
