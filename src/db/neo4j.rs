//! neo4rs-backed implementation of [`GraphStore`].
//!
//! Every operation runs exactly one parameterized Cypher statement. The
//! driver hands out a connection per statement and takes it back when the
//! result stream is drained, so there is no session state held across calls.
//! Statements that must MATCH a counterpart node end with a RETURN clause;
//! a drained stream with zero rows is the merge-layer no-op.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neo4rs::{query, Graph, Query};

use crate::config::Config;
use crate::db::convert::{datetime_param, parse_datetime, row_field};
use crate::db::{GraphStore, MergeOutcome};
use crate::error::AppResult;
use crate::models::{
    Comment, CommentParent, EdgeKind, LikeTarget, Rating, RecommendedItem, Tag, UserProfile,
};

/// Fragment merging the acting user with a full profile overwrite.
/// Spliced into statements that fold the user upsert into the same
/// atomic unit as the edge merge.
const USER_MERGE: &str = "MERGE (u:User {id: $user_id})
  ON CREATE SET u.is_bot = $is_bot,
                u.first_name = $first_name,
                u.last_name = $last_name,
                u.username = $username,
                u.language_code = $language_code
  ON MATCH SET  u.is_bot = $is_bot,
                u.first_name = $first_name,
                u.last_name = $last_name,
                u.username = $username,
                u.language_code = $language_code";

const TAG_AFFINITY: &str = "\
MATCH (u:User {id: $user_id})-[r:RATED]->(g:Item)<-[:TAGGED]-(t:Tag)-[:TAGGED]->(g2:Item)
MATCH (u)-[:LIKED]->(t)
WHERE NOT (u)-[:RATED]->(g2)
RETURN g2.id AS item_id, g2.name AS name, max(r.rank) AS rank, count(*) AS score
ORDER BY rank DESC, score DESC
LIMIT $limit";

const RATING_COOCCURRENCE: &str = "\
MATCH (u:User {id: $user_id})-[r:RATED]->(g:Item)<-[:TAGGED]-(t:Tag)-[:TAGGED]->(g2:Item)
WHERE NOT (u)-[:RATED]->(g2)
RETURN g2.id AS item_id, g2.name AS name, max(r.rank) AS rank, count(*) AS score
ORDER BY rank DESC, score DESC
LIMIT $limit";

/// Client for the backing Neo4j-compatible graph store
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Connects to the graph store described by the configuration.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let graph = Graph::new(
            &config.graph_uri,
            &config.graph_user,
            &config.graph_password,
        )
        .await?;
        Ok(Self { graph })
    }

    fn with_profile(q: Query, user: &UserProfile) -> Query {
        q.param("user_id", user.id)
            .param("is_bot", user.is_bot)
            .param("first_name", user.first_name.as_str())
            .param("last_name", user.last_name.as_str())
            .param("username", user.username.as_str())
            .param("language_code", user.language_code.as_str())
    }

    /// Runs one statement, drains its stream, and reports whether any row
    /// came back.
    async fn run_merge(&self, q: Query) -> AppResult<MergeOutcome> {
        let mut stream = self.graph.execute(q).await?;
        let mut matched = false;
        while stream.next().await?.is_some() {
            matched = true;
        }
        Ok(if matched {
            MergeOutcome::Applied
        } else {
            MergeOutcome::NoMatch
        })
    }

    async fn candidates(
        &self,
        cypher: &str,
        user_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RecommendedItem>> {
        let q = query(cypher)
            .param("user_id", user_id)
            .param("limit", limit as i64);

        let mut picks = Vec::new();
        let mut stream = self.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            picks.push(RecommendedItem {
                item_id: row_field(&row, "item_id")?,
                name: row_field(&row, "name")?,
                score: row_field(&row, "score")?,
                rank: row_field(&row, "rank")?,
            });
        }
        Ok(picks)
    }

    async fn upsert_marker_edge(
        &self,
        kind: EdgeKind,
        user_id: i64,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<MergeOutcome> {
        let cypher = format!(
            "MATCH (g:Item {{id: $item_id}})
MATCH (u:User {{id: $user_id}})
MERGE (u)-[r:{kind}]->(g)
  ON CREATE SET r.at = datetime($at)
  ON MATCH SET  r.at = datetime($at)
RETURN type(r) AS kind",
            kind = kind.as_str(),
        );

        let q = query(&cypher)
            .param("user_id", user_id)
            .param("item_id", item_id)
            .param("at", datetime_param(&at));
        self.run_merge(q).await
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn ensure_constraints(&self) -> AppResult<()> {
        let constraints = [
            "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
            "CREATE CONSTRAINT item_id IF NOT EXISTS FOR (g:Item) REQUIRE g.id IS UNIQUE",
            "CREATE CONSTRAINT tag_id IF NOT EXISTS FOR (t:Tag) REQUIRE t.id IS UNIQUE",
            "CREATE CONSTRAINT genre_id IF NOT EXISTS FOR (g:Genre) REQUIRE g.id IS UNIQUE",
            "CREATE CONSTRAINT actor_id IF NOT EXISTS FOR (a:Actor) REQUIRE a.id IS UNIQUE",
            "CREATE CONSTRAINT comment_id IF NOT EXISTS FOR (c:Comment) REQUIRE c.id IS UNIQUE",
        ];

        for stmt in constraints {
            if let Err(e) = self.graph.run(query(stmt)).await {
                tracing::warn!(error = %e, "Constraint may already exist");
            }
        }

        Ok(())
    }

    async fn upsert_user(&self, user: &UserProfile) -> AppResult<()> {
        let cypher = format!("{}\nRETURN u.id AS id", USER_MERGE);
        let q = Self::with_profile(query(&cypher), user);
        self.run_merge(q).await?;
        Ok(())
    }

    async fn upsert_item(&self, item_id: &str, name: &str) -> AppResult<()> {
        let q = query(
            "MERGE (g:Item {id: $item_id})
  ON CREATE SET g.name = $name
RETURN g.id AS id",
        )
        .param("item_id", item_id)
        .param("name", name);
        self.run_merge(q).await?;
        Ok(())
    }

    async fn upsert_item_tag(&self, item_id: &str, tag: &Tag) -> AppResult<MergeOutcome> {
        let q = query(
            "MATCH (g:Item {id: $item_id})
MERGE (t:Tag {id: $tag_id})
  ON CREATE SET t.name = $tag_name
MERGE (t)-[:TAGGED]->(g)
RETURN t.id AS id",
        )
        .param("item_id", item_id)
        .param("tag_id", tag.id)
        .param("tag_name", tag.name.as_str());
        self.run_merge(q).await
    }

    async fn upsert_rating(
        &self,
        user: &UserProfile,
        item_id: &str,
        rating: Rating,
    ) -> AppResult<MergeOutcome> {
        let cypher = format!(
            "MATCH (g:Item {{id: $item_id}})
{user_merge}
MERGE (u)-[r:RATED]->(g)
  ON CREATE SET r.rank = $rank, r.at = datetime($at)
  ON MATCH SET  r.rank = $rank, r.at = datetime($at)
RETURN r.rank AS rank",
            user_merge = USER_MERGE,
        );

        let q = Self::with_profile(query(&cypher), user)
            .param("item_id", item_id)
            .param("rank", rating.rank)
            .param("at", datetime_param(&rating.at));
        self.run_merge(q).await
    }

    async fn upsert_like(
        &self,
        user: &UserProfile,
        target: &LikeTarget,
        appraisal: Option<Rating>,
    ) -> AppResult<MergeOutcome> {
        let appraisal_set = if appraisal.is_some() {
            "\n  ON CREATE SET l.rank = $rank, l.at = datetime($at)\n  ON MATCH SET  l.rank = $rank, l.at = datetime($at)"
        } else {
            ""
        };
        let cypher = format!(
            "MATCH (n:{label} {{id: $target_id}})
{user_merge}
MERGE (u)-[l:LIKED]->(n){appraisal_set}
RETURN n.id AS id",
            label = target.label(),
            user_merge = USER_MERGE,
            appraisal_set = appraisal_set,
        );

        let mut q = Self::with_profile(query(&cypher), user);
        q = match target {
            LikeTarget::Tag(id) | LikeTarget::Genre(id) | LikeTarget::Actor(id) => {
                q.param("target_id", *id)
            }
            LikeTarget::Item(id) => q.param("target_id", id.as_str()),
        };
        if let Some(appraisal) = appraisal {
            q = q
                .param("rank", appraisal.rank)
                .param("at", datetime_param(&appraisal.at));
        }
        self.run_merge(q).await
    }

    async fn upsert_added(
        &self,
        user_id: i64,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<MergeOutcome> {
        self.upsert_marker_edge(EdgeKind::Added, user_id, item_id, at)
            .await
    }

    async fn upsert_requested(
        &self,
        user_id: i64,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<MergeOutcome> {
        self.upsert_marker_edge(EdgeKind::Requested, user_id, item_id, at)
            .await
    }

    async fn upsert_comment(
        &self,
        user_id: i64,
        parent: &CommentParent,
        comment: &Comment,
    ) -> AppResult<MergeOutcome> {
        let cypher = format!(
            "MATCH (p:{label} {{id: $parent_id}})
MATCH (u:User {{id: $user_id}})
MERGE (c:Comment {{id: $comment_id}})
  ON CREATE SET c.text = $text, c.at = datetime($at)
  ON MATCH SET  c.text = $text, c.at = datetime($at)
MERGE (u)-[:WROTE]->(c)
MERGE (c)-[:ABOUT]->(p)
RETURN c.id AS id",
            label = parent.label(),
        );

        let mut q = query(&cypher)
            .param("user_id", user_id)
            .param("comment_id", comment.id)
            .param("text", comment.text.as_str())
            .param("at", datetime_param(&comment.at));
        q = match parent {
            CommentParent::Item(id) => q.param("parent_id", id.as_str()),
            CommentParent::Comment(id) => q.param("parent_id", *id),
        };
        self.run_merge(q).await
    }

    async fn get_rating(&self, user_id: i64, item_id: &str) -> AppResult<Option<Rating>> {
        let q = query(
            "MATCH (:User {id: $user_id})-[r:RATED]->(:Item {id: $item_id})
RETURN r.rank AS rank, toString(r.at) AS at",
        )
        .param("user_id", user_id)
        .param("item_id", item_id);

        let mut found = None;
        let mut stream = self.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            let rank: i64 = row_field(&row, "rank")?;
            let at: String = row_field(&row, "at")?;
            found = Some(Rating {
                rank,
                at: parse_datetime(&at)?,
            });
        }
        Ok(found)
    }

    async fn find_tag_by_name(&self, name: &str) -> AppResult<Option<Tag>> {
        let q = query("MATCH (t:Tag {name: $name}) RETURN t.id AS id, t.name AS name")
            .param("name", name);

        let mut found = None;
        let mut stream = self.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            if found.is_none() {
                found = Some(Tag {
                    id: row_field(&row, "id")?,
                    name: row_field(&row, "name")?,
                });
            }
        }
        Ok(found)
    }

    async fn tag_affinity_candidates(
        &self,
        user_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RecommendedItem>> {
        self.candidates(TAG_AFFINITY, user_id, limit).await
    }

    async fn rating_cooccurrence_candidates(
        &self,
        user_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RecommendedItem>> {
        self.candidates(RATING_COOCCURRENCE, user_id, limit).await
    }
}
