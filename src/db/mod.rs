use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{
    Comment, CommentParent, LikeTarget, Rating, RecommendedItem, Tag, UserProfile,
};

pub mod convert;
pub mod memory;
pub mod neo4j;

pub use convert::parse_id;
pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

/// Result of a merge statement that must MATCH a counterpart node first.
///
/// A zero-row match is the defined no-op semantics of the upsert layer: the
/// store reports it, and callers decide whether it is a NotFound error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The counterpart matched and the merge was applied
    Applied,
    /// Zero rows matched; nothing was written
    NoMatch,
}

/// Injected store-client capability over the backing property graph.
///
/// Every method executes exactly one statement against the store and releases
/// its connection on all exit paths; there is no cross-call transactional
/// scope. All writes are merge-based and safe to retry.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create per-label uniqueness constraints. Idempotent.
    async fn ensure_constraints(&self) -> AppResult<()>;

    /// Create-or-update a User node; every profile field is overwritten.
    async fn upsert_user(&self, user: &UserProfile) -> AppResult<()>;

    /// Create an Item node if absent; the name is set on first creation only.
    async fn upsert_item(&self, item_id: &str, name: &str) -> AppResult<()>;

    /// Merge a Tag node and its TAGGED edge onto an existing item.
    async fn upsert_item_tag(&self, item_id: &str, tag: &Tag) -> AppResult<MergeOutcome>;

    /// Merge the acting user and their RATED edge in a single statement.
    async fn upsert_rating(
        &self,
        user: &UserProfile,
        item_id: &str,
        rating: Rating,
    ) -> AppResult<MergeOutcome>;

    /// Merge the acting user and a LIKED edge toward the target node.
    /// The appraisal payload, when present, is overwritten on the edge.
    async fn upsert_like(
        &self,
        user: &UserProfile,
        target: &LikeTarget,
        appraisal: Option<Rating>,
    ) -> AppResult<MergeOutcome>;

    /// Merge an ADDED edge carrying a single timestamp.
    async fn upsert_added(
        &self,
        user_id: i64,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<MergeOutcome>;

    /// Merge a REQUESTED edge carrying a single timestamp.
    async fn upsert_requested(
        &self,
        user_id: i64,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<MergeOutcome>;

    /// Merge a Comment node with its WROTE and ABOUT edges. Repeat writes
    /// with the same comment id overwrite text and timestamp; the ABOUT
    /// attachment is never re-parented.
    async fn upsert_comment(
        &self,
        user_id: i64,
        parent: &CommentParent,
        comment: &Comment,
    ) -> AppResult<MergeOutcome>;

    /// Read back the rating a user gave an item, if any.
    async fn get_rating(&self, user_id: i64, item_id: &str) -> AppResult<Option<Rating>>;

    /// Resolve a tag by its exact name.
    async fn find_tag_by_name(&self, name: &str) -> AppResult<Option<Tag>>;

    /// Candidate items connected through tags the user both rated through
    /// and explicitly liked. At most `limit` rows, one per item, ordered by
    /// contributing rank then path count, both descending. Items the user
    /// has already rated are excluded.
    async fn tag_affinity_candidates(
        &self,
        user_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RecommendedItem>>;

    /// Candidate items connected through tags of rated items, with no
    /// requirement that the tag itself was liked. Same shape and ordering
    /// as `tag_affinity_candidates`.
    async fn rating_cooccurrence_candidates(
        &self,
        user_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RecommendedItem>>;
}
