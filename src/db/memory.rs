//! In-memory implementation of [`GraphStore`].
//!
//! Keeps the whole graph in `tokio::sync::RwLock`-guarded maps so the
//! recorder and recommendation services can be exercised without a live
//! store. The traversal strategies are reimplemented over the edge maps
//! with the same semantics as the Cypher statements in `neo4j.rs`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::db::{GraphStore, MergeOutcome};
use crate::error::AppResult;
use crate::models::{
    Comment, CommentParent, LikeTarget, Rating, RecommendedItem, Tag, UserProfile,
};

#[derive(Default)]
struct GraphData {
    users: HashMap<i64, UserProfile>,
    /// Item id -> name
    items: HashMap<String, String>,
    /// Tag id -> name
    tags: HashMap<i64, String>,
    genres: HashMap<i64, String>,
    actors: HashMap<i64, String>,
    /// (tag id, item id)
    tagged: HashSet<(i64, String)>,
    /// (user id, item id) -> rating
    rated: HashMap<(i64, String), Rating>,
    /// (user id, target) -> optional appraisal payload
    liked: HashMap<(i64, LikeTarget), Option<Rating>>,
    added: HashMap<(i64, String), DateTime<Utc>>,
    requested: HashMap<(i64, String), DateTime<Utc>>,
    comments: HashMap<i64, Comment>,
    wrote: HashSet<(i64, i64)>,
    /// Comment id -> parent, fixed at creation
    about: HashMap<i64, CommentParent>,
}

/// In-memory graph store for tests and local development
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<GraphData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a Genre node, standing in for the out-of-scope catalog feed.
    pub async fn seed_genre(&self, id: i64, name: &str) {
        self.data.write().await.genres.insert(id, name.to_string());
    }

    /// Seeds an Actor node, standing in for the out-of-scope catalog feed.
    pub async fn seed_actor(&self, id: i64, name: &str) {
        self.data.write().await.actors.insert(id, name.to_string());
    }

    pub async fn user(&self, id: i64) -> Option<UserProfile> {
        self.data.read().await.users.get(&id).cloned()
    }

    pub async fn comment(&self, id: i64) -> Option<Comment> {
        self.data.read().await.comments.get(&id).cloned()
    }

    pub async fn comment_parent(&self, id: i64) -> Option<CommentParent> {
        self.data.read().await.about.get(&id).cloned()
    }

    pub async fn added_at(&self, user_id: i64, item_id: &str) -> Option<DateTime<Utc>> {
        self.data
            .read()
            .await
            .added
            .get(&(user_id, item_id.to_string()))
            .copied()
    }

    pub async fn requested_at(&self, user_id: i64, item_id: &str) -> Option<DateTime<Utc>> {
        self.data
            .read()
            .await
            .requested
            .get(&(user_id, item_id.to_string()))
            .copied()
    }

    pub async fn like_exists(&self, user_id: i64, target: &LikeTarget) -> bool {
        self.data
            .read()
            .await
            .liked
            .contains_key(&(user_id, target.clone()))
    }
}

fn target_exists(data: &GraphData, target: &LikeTarget) -> bool {
    match target {
        LikeTarget::Tag(id) => data.tags.contains_key(id),
        LikeTarget::Genre(id) => data.genres.contains_key(id),
        LikeTarget::Actor(id) => data.actors.contains_key(id),
        LikeTarget::Item(id) => data.items.contains_key(id),
    }
}

fn parent_exists(data: &GraphData, parent: &CommentParent) -> bool {
    match parent {
        CommentParent::Item(id) => data.items.contains_key(id),
        CommentParent::Comment(id) => data.comments.contains_key(id),
    }
}

/// Shared traversal for both strategies. A qualifying path runs from a
/// rated item through one of its tags to a distinct candidate item; the
/// tag-affinity variant additionally requires a LIKED edge on the tag.
/// Candidates the user has already rated are excluded.
fn recommend(
    data: &GraphData,
    user_id: i64,
    require_liked_tag: bool,
    limit: usize,
) -> Vec<RecommendedItem> {
    let mut items_by_tag: HashMap<i64, Vec<&str>> = HashMap::new();
    let mut tags_by_item: HashMap<&str, Vec<i64>> = HashMap::new();
    for (tag_id, item_id) in &data.tagged {
        items_by_tag.entry(*tag_id).or_default().push(item_id);
        tags_by_item.entry(item_id.as_str()).or_default().push(*tag_id);
    }

    // item id -> (path count, highest contributing rank)
    let mut paths: HashMap<&str, (i64, i64)> = HashMap::new();
    for ((uid, rated_item), rating) in &data.rated {
        if *uid != user_id {
            continue;
        }
        let Some(tag_ids) = tags_by_item.get(rated_item.as_str()) else {
            continue;
        };
        for tag_id in tag_ids {
            if require_liked_tag
                && !data.liked.contains_key(&(user_id, LikeTarget::Tag(*tag_id)))
            {
                continue;
            }
            let Some(candidates) = items_by_tag.get(tag_id) else {
                continue;
            };
            for &candidate in candidates {
                if data.rated.contains_key(&(user_id, candidate.to_string())) {
                    continue;
                }
                let entry = paths.entry(candidate).or_insert((0, rating.rank));
                entry.0 += 1;
                entry.1 = entry.1.max(rating.rank);
            }
        }
    }

    let mut picks: Vec<RecommendedItem> = paths
        .into_iter()
        .map(|(item_id, (score, rank))| RecommendedItem {
            name: data.items.get(item_id).cloned().unwrap_or_default(),
            item_id: item_id.to_string(),
            score,
            rank,
        })
        .collect();

    picks.sort_by(|a, b| {
        b.rank
            .cmp(&a.rank)
            .then(b.score.cmp(&a.score))
            .then(a.item_id.cmp(&b.item_id))
    });
    picks.truncate(limit);
    picks
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn ensure_constraints(&self) -> AppResult<()> {
        // Map keys already enforce per-label uniqueness.
        Ok(())
    }

    async fn upsert_user(&self, user: &UserProfile) -> AppResult<()> {
        let mut data = self.data.write().await;
        data.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn upsert_item(&self, item_id: &str, name: &str) -> AppResult<()> {
        let mut data = self.data.write().await;
        data.items
            .entry(item_id.to_string())
            .or_insert_with(|| name.to_string());
        Ok(())
    }

    async fn upsert_item_tag(&self, item_id: &str, tag: &Tag) -> AppResult<MergeOutcome> {
        let mut data = self.data.write().await;
        if !data.items.contains_key(item_id) {
            return Ok(MergeOutcome::NoMatch);
        }
        data.tags
            .entry(tag.id)
            .or_insert_with(|| tag.name.clone());
        data.tagged.insert((tag.id, item_id.to_string()));
        Ok(MergeOutcome::Applied)
    }

    async fn upsert_rating(
        &self,
        user: &UserProfile,
        item_id: &str,
        rating: Rating,
    ) -> AppResult<MergeOutcome> {
        let mut data = self.data.write().await;
        if !data.items.contains_key(item_id) {
            return Ok(MergeOutcome::NoMatch);
        }
        data.users.insert(user.id, user.clone());
        data.rated.insert((user.id, item_id.to_string()), rating);
        Ok(MergeOutcome::Applied)
    }

    async fn upsert_like(
        &self,
        user: &UserProfile,
        target: &LikeTarget,
        appraisal: Option<Rating>,
    ) -> AppResult<MergeOutcome> {
        let mut data = self.data.write().await;
        if !target_exists(&data, target) {
            return Ok(MergeOutcome::NoMatch);
        }
        data.users.insert(user.id, user.clone());
        data.liked.insert((user.id, target.clone()), appraisal);
        Ok(MergeOutcome::Applied)
    }

    async fn upsert_added(
        &self,
        user_id: i64,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<MergeOutcome> {
        let mut data = self.data.write().await;
        if !data.items.contains_key(item_id) || !data.users.contains_key(&user_id) {
            return Ok(MergeOutcome::NoMatch);
        }
        data.added.insert((user_id, item_id.to_string()), at);
        Ok(MergeOutcome::Applied)
    }

    async fn upsert_requested(
        &self,
        user_id: i64,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<MergeOutcome> {
        let mut data = self.data.write().await;
        if !data.items.contains_key(item_id) || !data.users.contains_key(&user_id) {
            return Ok(MergeOutcome::NoMatch);
        }
        data.requested.insert((user_id, item_id.to_string()), at);
        Ok(MergeOutcome::Applied)
    }

    async fn upsert_comment(
        &self,
        user_id: i64,
        parent: &CommentParent,
        comment: &Comment,
    ) -> AppResult<MergeOutcome> {
        let mut data = self.data.write().await;
        if !parent_exists(&data, parent) || !data.users.contains_key(&user_id) {
            return Ok(MergeOutcome::NoMatch);
        }
        data.comments.insert(comment.id, comment.clone());
        data.wrote.insert((user_id, comment.id));
        // First write wins; a comment is never re-parented.
        data.about.entry(comment.id).or_insert_with(|| parent.clone());
        Ok(MergeOutcome::Applied)
    }

    async fn get_rating(&self, user_id: i64, item_id: &str) -> AppResult<Option<Rating>> {
        let data = self.data.read().await;
        Ok(data.rated.get(&(user_id, item_id.to_string())).copied())
    }

    async fn find_tag_by_name(&self, name: &str) -> AppResult<Option<Tag>> {
        let data = self.data.read().await;
        Ok(data
            .tags
            .iter()
            .find(|(_, tag_name)| tag_name.as_str() == name)
            .map(|(id, tag_name)| Tag {
                id: *id,
                name: tag_name.clone(),
            }))
    }

    async fn tag_affinity_candidates(
        &self,
        user_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RecommendedItem>> {
        let data = self.data.read().await;
        Ok(recommend(&data, user_id, true, limit))
    }

    async fn rating_cooccurrence_candidates(
        &self,
        user_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RecommendedItem>> {
        let data = self.data.read().await;
        Ok(recommend(&data, user_id, false, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(rank: i64) -> Rating {
        Rating {
            rank,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_user_is_idempotent() {
        let store = MemoryStore::new();
        let mut user = UserProfile::unknown(7);
        store.upsert_user(&user).await.unwrap();

        user.username = "renamed".to_string();
        store.upsert_user(&user).await.unwrap();

        let stored = store.user(7).await.unwrap();
        assert_eq!(stored.username, "renamed");
    }

    #[tokio::test]
    async fn test_item_name_set_on_create_only() {
        let store = MemoryStore::new();
        store.upsert_item("svr", "Steel Vanguard").await.unwrap();
        store.upsert_item("svr", "Renamed").await.unwrap();

        let data = store.data.read().await;
        assert_eq!(data.items.get("svr").unwrap(), "Steel Vanguard");
    }

    #[tokio::test]
    async fn test_item_tag_requires_item() {
        let store = MemoryStore::new();
        let tag = Tag {
            id: 1,
            name: "strategy".to_string(),
        };
        let outcome = store.upsert_item_tag("missing", &tag).await.unwrap();
        assert_eq!(outcome, MergeOutcome::NoMatch);

        store.upsert_item("svr", "Steel Vanguard").await.unwrap();
        let outcome = store.upsert_item_tag("svr", &tag).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Applied);
    }

    #[tokio::test]
    async fn test_rating_overwrites_in_place() {
        let store = MemoryStore::new();
        let user = UserProfile::unknown(1);
        store.upsert_item("svr", "Steel Vanguard").await.unwrap();

        store.upsert_rating(&user, "svr", rating(2)).await.unwrap();
        store.upsert_rating(&user, "svr", rating(5)).await.unwrap();

        let stored = store.get_rating(1, "svr").await.unwrap().unwrap();
        assert_eq!(stored.rank, 5);
        assert_eq!(store.data.read().await.rated.len(), 1);
    }

    #[tokio::test]
    async fn test_comment_keeps_first_parent() {
        let store = MemoryStore::new();
        let user = UserProfile::unknown(1);
        store.upsert_user(&user).await.unwrap();
        store.upsert_item("svr", "Steel Vanguard").await.unwrap();
        store.upsert_item("hld", "Harvest Lands").await.unwrap();

        let comment = Comment {
            id: 100,
            text: "great".to_string(),
            at: Utc::now(),
        };
        let first_parent = CommentParent::Item("svr".to_string());
        store
            .upsert_comment(1, &first_parent, &comment)
            .await
            .unwrap();

        let edited = Comment {
            id: 100,
            text: "edited".to_string(),
            at: Utc::now(),
        };
        store
            .upsert_comment(1, &CommentParent::Item("hld".to_string()), &edited)
            .await
            .unwrap();

        assert_eq!(store.comment(100).await.unwrap().text, "edited");
        assert_eq!(store.comment_parent(100).await.unwrap(), first_parent);
    }

    #[tokio::test]
    async fn test_find_tag_by_name() {
        let store = MemoryStore::new();
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

        let tag = store.find_tag_by_name("strategy").await.unwrap().unwrap();
        assert_eq!(tag.id, 11);
        assert!(store.find_tag_by_name("shooter").await.unwrap().is_none());
    }
}
