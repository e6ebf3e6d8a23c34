use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    db::{GraphStore, MergeOutcome},
    error::{AppError, AppResult},
    models::{validate_rank, Comment, CommentParent, LikeTarget, Rating, Tag, UserProfile},
};

/// Records user interactions as graph edges.
///
/// Each operation validates its input, upserts the acting user with the
/// latest profile snapshot, then merges the single corresponding edge.
/// A missing counterpart node surfaces as [`AppError::NotFound`]; the
/// store itself reports it as a zero-row no-op.
pub struct InteractionRecorder {
    store: Arc<dyn GraphStore>,
}

impl InteractionRecorder {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Rates an item on the closed 1..=5 scale. Re-rating the same item
    /// overwrites rank and timestamp in place.
    pub async fn record_rating(
        &self,
        user: &UserProfile,
        item_id: &str,
        rank: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        validate_rank(rank)?;

        let rating = Rating { rank, at };
        match self.store.upsert_rating(user, item_id, rating).await? {
            MergeOutcome::Applied => {
                tracing::info!(user_id = user.id, item_id, rank, "Rating recorded");
                Ok(())
            }
            MergeOutcome::NoMatch => Err(AppError::NotFound(format!("item {}", item_id))),
        }
    }

    /// Likes a tag, genre, actor or item. The appraisal payload is carried
    /// on the edge when the like concerns a rated entity.
    pub async fn record_like(
        &self,
        user: &UserProfile,
        target: LikeTarget,
        appraisal: Option<Rating>,
    ) -> AppResult<()> {
        if let Some(appraisal) = &appraisal {
            validate_rank(appraisal.rank)?;
        }

        match self.store.upsert_like(user, &target, appraisal).await? {
            MergeOutcome::Applied => {
                tracing::info!(user_id = user.id, target = %target, "Like recorded");
                Ok(())
            }
            MergeOutcome::NoMatch => Err(AppError::NotFound(format!("{}", target))),
        }
    }

    /// Resolves a tag by name and likes it. Tag names are matched
    /// case-insensitively by lowercasing, the form the catalog sync writes.
    pub async fn like_tag_by_name(&self, user: &UserProfile, name: &str) -> AppResult<Tag> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "Tag name cannot be empty".to_string(),
            ));
        }

        let tag = self
            .store
            .find_tag_by_name(&name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tag \"{}\"", name)))?;

        self.record_like(user, LikeTarget::Tag(tag.id), None).await?;
        Ok(tag)
    }

    /// Marks an item as added to the user's list.
    pub async fn record_addition(
        &self,
        user: &UserProfile,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.store.upsert_user(user).await?;
        match self.store.upsert_added(user.id, item_id, at).await? {
            MergeOutcome::Applied => {
                tracing::info!(user_id = user.id, item_id, "Addition recorded");
                Ok(())
            }
            MergeOutcome::NoMatch => Err(AppError::NotFound(format!("item {}", item_id))),
        }
    }

    /// Marks an item as requested by the user.
    pub async fn record_request(
        &self,
        user: &UserProfile,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.store.upsert_user(user).await?;
        match self.store.upsert_requested(user.id, item_id, at).await? {
            MergeOutcome::Applied => {
                tracing::info!(user_id = user.id, item_id, "Request recorded");
                Ok(())
            }
            MergeOutcome::NoMatch => Err(AppError::NotFound(format!("item {}", item_id))),
        }
    }

    /// Comments on an item or on another comment. The caller owns comment
    /// identity; re-presenting an id edits text and timestamp, and the
    /// returned id echoes the stored one.
    pub async fn record_comment(
        &self,
        user: &UserProfile,
        parent: CommentParent,
        comment: Comment,
    ) -> AppResult<i64> {
        self.store.upsert_user(user).await?;
        match self.store.upsert_comment(user.id, &parent, &comment).await? {
            MergeOutcome::Applied => {
                tracing::info!(
                    user_id = user.id,
                    comment_id = comment.id,
                    "Comment recorded"
                );
                Ok(comment.id)
            }
            MergeOutcome::NoMatch => Err(AppError::NotFound(match parent {
                CommentParent::Item(id) => format!("item {}", id),
                CommentParent::Comment(id) => format!("comment {}", id),
            })),
        }
    }

    /// Reads back the rating a user gave an item. Absence is `Ok(None)`.
    pub async fn rating_for(&self, user_id: i64, item_id: &str) -> AppResult<Option<Rating>> {
        self.store.get_rating(user_id, item_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Tag;

    async fn store_with_item() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.upsert_item("svr", "Steel Vanguard").await.unwrap();
        store
            .upsert_item_tag(
                "svr",
                &Tag {
                    id: 11,
                    name: "strategy".to_string(),
                },
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_rating_is_unique_per_pair_with_last_write_wins() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        recorder
            .record_rating(&user, "svr", 2, Utc::now())
            .await
            .unwrap();
        let at = Utc::now();
        recorder.record_rating(&user, "svr", 4, at).await.unwrap();

        let stored = recorder.rating_for(1, "svr").await.unwrap().unwrap();
        assert_eq!(stored.rank, 4);
        assert_eq!(stored.at, at);
    }

    #[tokio::test]
    async fn test_out_of_range_rank_rejected_before_store_call() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        let err = recorder
            .record_rating(&user, "svr", 9, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        // Nothing reached the store: no edge and no user upsert.
        assert!(recorder.rating_for(1, "svr").await.unwrap().is_none());
        assert!(store.user(1).await.is_none());
    }

    #[tokio::test]
    async fn test_rating_nonexistent_item_is_not_found() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        let err = recorder
            .record_rating(&user, "missing", 5, Utc::now())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(recorder.rating_for(1, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_like_tag_by_name_normalizes_and_records() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        let tag = recorder
            .like_tag_by_name(&user, "  STRATEGY ")
            .await
            .unwrap();
        assert_eq!(tag.id, 11);
        assert!(store.like_exists(1, &LikeTarget::Tag(11)).await);
    }

    #[tokio::test]
    async fn test_like_unknown_tag_name_is_not_found() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store);
        let user = UserProfile::unknown(1);

        let err = recorder
            .like_tag_by_name(&user, "shooter")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_like_with_invalid_appraisal_rejected() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        let appraisal = Rating {
            rank: 0,
            at: Utc::now(),
        };
        let err = recorder
            .record_like(&user, LikeTarget::Item("svr".to_string()), Some(appraisal))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(
            !store
                .like_exists(1, &LikeTarget::Item("svr".to_string()))
                .await
        );
    }

    #[tokio::test]
    async fn test_genre_like_carries_appraisal_payload() {
        let store = store_with_item().await;
        store.seed_genre(3, "tactics").await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        let appraisal = Rating {
            rank: 5,
            at: Utc::now(),
        };
        recorder
            .record_like(&user, LikeTarget::Genre(3), Some(appraisal))
            .await
            .unwrap();
        assert!(store.like_exists(1, &LikeTarget::Genre(3)).await);
    }

    #[tokio::test]
    async fn test_like_on_unsynced_actor_is_not_found() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        let err = recorder
            .record_like(&user, LikeTarget::Actor(8), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        store.seed_actor(8, "Lena Ortiz").await;
        recorder
            .record_like(&user, LikeTarget::Actor(8), None)
            .await
            .unwrap();
        assert!(store.like_exists(1, &LikeTarget::Actor(8)).await);
    }

    #[tokio::test]
    async fn test_addition_and_request_are_idempotent() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        let first = Utc::now();
        recorder.record_addition(&user, "svr", first).await.unwrap();
        let second = Utc::now();
        recorder
            .record_addition(&user, "svr", second)
            .await
            .unwrap();
        assert_eq!(store.added_at(1, "svr").await, Some(second));

        recorder.record_request(&user, "svr", second).await.unwrap();
        assert_eq!(store.requested_at(1, "svr").await, Some(second));
    }

    #[tokio::test]
    async fn test_comment_echoes_id_and_edits_in_place() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        let id = recorder
            .record_comment(
                &user,
                CommentParent::Item("svr".to_string()),
                Comment {
                    id: 500,
                    text: "solid".to_string(),
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert_eq!(id, 500);

        recorder
            .record_comment(
                &user,
                CommentParent::Item("svr".to_string()),
                Comment {
                    id: 500,
                    text: "solid, replayed it".to_string(),
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert_eq!(store.comment(500).await.unwrap().text, "solid, replayed it");
    }

    #[tokio::test]
    async fn test_threaded_comment_on_comment() {
        let store = store_with_item().await;
        let recorder = InteractionRecorder::new(store.clone());
        let user = UserProfile::unknown(1);

        recorder
            .record_comment(
                &user,
                CommentParent::Item("svr".to_string()),
                Comment {
                    id: 500,
                    text: "solid".to_string(),
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();
        recorder
            .record_comment(
                &user,
                CommentParent::Comment(500),
                Comment {
                    id: 501,
                    text: "agreed".to_string(),
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            store.comment_parent(501).await.unwrap(),
            CommentParent::Comment(500)
        );
    }
}
