//! Candidate scoring and ranking.

use crate::marketplace::types::Candidate;

use super::embedding::EmbeddingProvider;
use super::similarity::{
    combined_score, lexical_similarity, semantic_similarity, SemanticScore,
};

/// How many ranked candidates the disposition policy inspects.
pub const DISPOSITION_POOL: usize = 5;

/// Upper bound on competitor price records written per product per run.
pub const MAX_PRICE_RECORDS: usize = 3;

/// A candidate annotated with its similarity scores against the product name.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub lexical: f64,
    pub semantic: SemanticScore,
    pub combined: f64,
}

/// Score every candidate against the product display name. Candidate order
/// is preserved; ranking happens separately so ties stay reproducible.
pub async fn score_candidates(
    product_name: &str,
    candidates: Vec<Candidate>,
    embeddings: Option<&dyn EmbeddingProvider>,
) -> Vec<ScoredCandidate> {
    let mut scored = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let lexical = lexical_similarity(product_name, &candidate.name);
        let semantic = semantic_similarity(embeddings, product_name, &candidate.name).await;
        let combined = combined_score(lexical, semantic);
        scored.push(ScoredCandidate {
            candidate,
            lexical,
            semantic,
            combined,
        });
    }
    scored
}

/// Sort descending by combined score and keep the disposition pool.
///
/// The sort must be stable: scores are floats and near-ties are common with
/// short titles, so ties fall back to input order for reproducibility.
pub fn rank(mut scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    scored.sort_by(|a, b| b.combined.total_cmp(&a.combined));
    scored.truncate(DISPOSITION_POOL);
    scored
}
