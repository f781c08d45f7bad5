//! Sidebar unseen counts.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::UserId;
use chathub_database::MessageStore;

/// Computes how many unseen messages each counterpart has sent a viewer.
#[derive(Debug, Clone)]
pub struct UnseenAggregator {
    store: Arc<dyn MessageStore>,
}

impl UnseenAggregator {
    /// Creates a new aggregator.
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Unseen `candidate → viewer` counts, omitting zeros.
    ///
    /// The viewer and duplicate candidates are ignored. Each count is read
    /// from the store's counter rather than recounted.
    pub async fn sidebar_counts(
        &self,
        viewer: UserId,
        candidates: &[UserId],
    ) -> AppResult<HashMap<UserId, u64>> {
        let unique: BTreeSet<UserId> = candidates
            .iter()
            .copied()
            .filter(|c| *c != viewer)
            .collect();

        let counts = try_join_all(unique.into_iter().map(|candidate| async move {
            let unseen = self.store.count_unseen(candidate, viewer).await?;
            Ok::<_, AppError>((candidate, unseen))
        }))
        .await?;

        Ok(counts.into_iter().filter(|(_, n)| *n > 0).collect())
    }
}
