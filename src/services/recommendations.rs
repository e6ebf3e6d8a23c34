use std::sync::Arc;

use crate::{db::GraphStore, error::AppResult, models::RecommendedItem};

/// Upper bound on the number of items a single request returns
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Produces ranked item recommendations from the interaction graph.
///
/// Two traversal strategies run in order. The tag-affinity strategy needs
/// both a rating path and an explicit like on the connecting tag, which is
/// the higher-confidence signal; when it yields nothing, the broader
/// rating-cooccurrence traversal answers from rating history alone. Zero
/// rows from both is a valid empty result, not an error.
pub struct Recommender {
    store: Arc<dyn GraphStore>,
}

impl Recommender {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn recommend(&self, user_id: i64) -> AppResult<Vec<RecommendedItem>> {
        let picks = self
            .store
            .tag_affinity_candidates(user_id, MAX_RECOMMENDATIONS)
            .await?;
        if !picks.is_empty() {
            tracing::info!(
                user_id,
                results = picks.len(),
                strategy = "tag_affinity",
                "Recommendations computed"
            );
            return Ok(picks);
        }

        let picks = self
            .store
            .rating_cooccurrence_candidates(user_id, MAX_RECOMMENDATIONS)
            .await?;
        tracing::info!(
            user_id,
            results = picks.len(),
            strategy = "rating_cooccurrence",
            "Recommendations computed"
        );
        Ok(picks)
    }
}
