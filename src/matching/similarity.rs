//! Similarity providers and the score combiner.
//!
//! Lexical similarity is the floor: pure, deterministic, no I/O, always
//! available. Semantic similarity is an enhancement layered on top of an
//! optional embedding provider; when it is unconfigured or a call fails, the
//! combined score degrades to the lexical score and ranking stays fully
//! functional.

use strsim::normalized_levenshtein;
use tracing::debug;

use super::embedding::EmbeddingProvider;

/// Case-insensitive character-sequence ratio in [0, 1]. `lexical(a, a) == 1.0`.
pub fn lexical_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(
        a.trim().to_lowercase().as_str(),
        b.trim().to_lowercase().as_str(),
    )
}

/// Outcome of one semantic comparison. Unavailability is a first-class
/// state, not a magic number, so the combiner branches on a type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SemanticScore {
    Score(f64),
    Unavailable,
}

impl SemanticScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            SemanticScore::Score(s) => Some(*s),
            SemanticScore::Unavailable => None,
        }
    }
}

/// Cosine similarity clamped to [0, 1]; 0 when either vector has zero norm.
pub fn cosine_similarity(u: &[f32], v: &[f32]) -> f64 {
    if u.len() != v.len() || u.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_u = 0.0f64;
    let mut norm_v = 0.0f64;
    for (a, b) in u.iter().zip(v) {
        dot += f64::from(*a) * f64::from(*b);
        norm_u += f64::from(*a) * f64::from(*a);
        norm_v += f64::from(*b) * f64::from(*b);
    }
    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }
    (dot / (norm_u.sqrt() * norm_v.sqrt())).clamp(0.0, 1.0)
}

/// Embedding-based similarity of two strings. Any provider absence or
/// per-call failure collapses to `Unavailable`; errors never reach the
/// caller.
pub async fn semantic_similarity(
    provider: Option<&dyn EmbeddingProvider>,
    a: &str,
    b: &str,
) -> SemanticScore {
    let Some(provider) = provider else {
        return SemanticScore::Unavailable;
    };

    let u = match provider.embed(a).await {
        Ok(v) => v,
        Err(e) => {
            debug!(text = a, error = %e, "embedding call failed");
            return SemanticScore::Unavailable;
        }
    };
    let v = match provider.embed(b).await {
        Ok(v) => v,
        Err(e) => {
            debug!(text = b, error = %e, "embedding call failed");
            return SemanticScore::Unavailable;
        }
    };

    SemanticScore::Score(cosine_similarity(&u, &v))
}

/// Combined ranking score: lexical when semantic is unavailable, otherwise
/// the max of the two. Semantic similarity can only improve a score, never
/// regress it.
pub fn combined_score(lexical: f64, semantic: SemanticScore) -> f64 {
    match semantic {
        SemanticScore::Score(s) => lexical.max(s),
        SemanticScore::Unavailable => lexical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    struct FailingEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbeddings {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(anyhow!("provider outage"))
        }
    }

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(lexical_similarity("Widget X", "Widget X"), 1.0);
        assert_eq!(lexical_similarity("آبمیوه گیر", "آبمیوه گیر"), 1.0);
    }

    #[test]
    fn lexical_is_case_insensitive() {
        assert_eq!(lexical_similarity("WIDGET x", "widget X"), 1.0);
    }

    #[test]
    fn lexical_stays_in_unit_interval() {
        for (a, b) in [("a", "z"), ("Widget X", "Totally Different Item"), ("", "abc")] {
            let s = lexical_similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "{a} vs {b} gave {s}");
        }
    }

    #[test]
    fn cosine_handles_zero_norm_and_identity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        let s = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((s - 1.0).abs() < 1e-9);
        // Opposed vectors clamp to 0 rather than going negative.
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
    }

    #[test]
    fn semantic_success_can_only_raise_the_score() {
        let lex = lexical_similarity("Widget X", "Widget X Pro");
        assert!(combined_score(lex, SemanticScore::Score(0.99)) >= lex);
        assert!(combined_score(lex, SemanticScore::Score(0.01)) >= lex);
        assert!((0.0..=1.0).contains(&combined_score(lex, SemanticScore::Score(0.42))));
    }

    #[tokio::test]
    async fn full_outage_degrades_to_lexical() {
        let provider = FailingEmbeddings;
        for (a, b) in [("Widget X", "Widget X Pro"), ("abc", "xyz")] {
            let sem = semantic_similarity(Some(&provider), a, b).await;
            assert_eq!(sem, SemanticScore::Unavailable);
            assert_eq!(combined_score(lexical_similarity(a, b), sem), lexical_similarity(a, b));
        }
    }

    #[tokio::test]
    async fn unconfigured_provider_is_unavailable() {
        let sem = semantic_similarity(None, "a", "b").await;
        assert_eq!(sem, SemanticScore::Unavailable);
    }
}
