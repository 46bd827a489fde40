//! Per-product reconciliation pipeline.
//!
//! One product runs end to end — search, score, rank, dispose, resolve
//! sellers, write — before the caller moves to the next. All collaborator
//! failures degrade locally: a failed search means zero candidates, a failed
//! upsert skips one record, and neither aborts the run.

use anyhow::Result;
use tracing::{info, warn};

use crate::database_ops::store::{CompetitorPriceRecord, ReconStore};
use crate::marketplace::client::{CandidateSource, DetailSource};
use crate::marketplace::sellers::resolve_seller;
use crate::marketplace::types::Product;
use crate::matching::disposition::dispose;
use crate::matching::embedding::EmbeddingProvider;
use crate::matching::rank::{rank, score_candidates, MAX_PRICE_RECORDS};

/// What one pipeline run did, for loop-level reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Ranked candidates the disposition policy inspected (≤ 5).
    pub considered: usize,
    /// Competitor price records upserted (≤ 3).
    pub written: usize,
    /// Whether a review item was enqueued.
    pub reviewed: bool,
}

/// Run the full matching pipeline for one product.
pub async fn reconcile_product(
    product: &Product,
    search: &dyn CandidateSource,
    details: &dyn DetailSource,
    embeddings: Option<&dyn EmbeddingProvider>,
    store: &dyn ReconStore,
) -> Result<ReconcileOutcome> {
    let slug = product.slug();
    let mut outcome = ReconcileOutcome::default();

    let candidates = match search.search(&slug).await {
        Ok(c) => c,
        Err(e) => {
            warn!(%slug, error = %e, "marketplace search failed; treating as zero candidates");
            return Ok(outcome);
        }
    };
    if candidates.is_empty() {
        info!(%slug, "no marketplace candidates");
        return Ok(outcome);
    }

    let scored = score_candidates(&product.name, candidates, embeddings).await;
    let ranked = rank(scored);
    outcome.considered = ranked.len();

    // Advisory review routing; never gates persistence.
    if let Some(item) = dispose(product, &ranked) {
        info!(
            %slug,
            candidate = %item.candidate_name,
            fuzzy = item.fuzzy_score,
            semantic = ?item.semantic_score,
            "best match below threshold; queued for review"
        );
        if let Err(e) = store.enqueue_review(&item).await {
            warn!(%slug, error = %e, "failed to enqueue review item; continuing");
        } else {
            outcome.reviewed = true;
        }
    }

    for top in ranked.iter().take(MAX_PRICE_RECORDS) {
        let seller = resolve_seller(&top.candidate, details).await;
        let record = CompetitorPriceRecord {
            product_slug: slug.clone(),
            competitor_name: seller,
            competitor_price: top.candidate.price,
        };
        match store.upsert_competitor_price(&record).await {
            Ok(()) => {
                info!(
                    %slug,
                    seller = %record.competitor_name,
                    price = record.competitor_price,
                    score = top.combined,
                    "competitor price stored"
                );
                outcome.written += 1;
            }
            Err(e) => warn!(
                %slug,
                seller = %record.competitor_name,
                error = %e,
                "competitor price upsert failed; continuing with next candidate"
            ),
        }
    }

    Ok(outcome)
}
