use std::fmt::Display;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Closed ordinal scale for rating ranks
pub const RANK_SCALE: RangeInclusive<i64> = 1..=5;

/// Node labels known to the graph store
///
/// Kept as an enum so an unknown label is a compile-time impossibility
/// rather than a typo in a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    User,
    Item,
    Tag,
    Genre,
    Actor,
    Comment,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::User => "User",
            NodeLabel::Item => "Item",
            NodeLabel::Tag => "Tag",
            NodeLabel::Genre => "Genre",
            NodeLabel::Actor => "Actor",
            NodeLabel::Comment => "Comment",
        }
    }
}

impl Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed edge kinds between graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Rated,
    Liked,
    Tagged,
    Added,
    Requested,
    Wrote,
    About,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Rated => "RATED",
            EdgeKind::Liked => "LIKED",
            EdgeKind::Tagged => "TAGGED",
            EdgeKind::Added => "ADDED",
            EdgeKind::Requested => "REQUESTED",
            EdgeKind::Wrote => "WROTE",
            EdgeKind::About => "ABOUT",
        }
    }
}

impl Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rating signal: ordinal rank plus the instant it was expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub rank: i64,
    pub at: DateTime<Utc>,
}

/// Rejects ranks outside the closed ordinal scale before they reach the store.
pub fn validate_rank(rank: i64) -> AppResult<()> {
    if RANK_SCALE.contains(&rank) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "rank {} outside {}..={}",
            rank,
            RANK_SCALE.start(),
            RANK_SCALE.end()
        )))
    }
}

/// Target of a LIKED edge
///
/// One edge kind covers all four target labels; an optional appraisal
/// payload travels with the edge when the like concerns a rated entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LikeTarget {
    Tag(i64),
    Genre(i64),
    Actor(i64),
    Item(String),
}

impl LikeTarget {
    pub fn label(&self) -> NodeLabel {
        match self {
            LikeTarget::Tag(_) => NodeLabel::Tag,
            LikeTarget::Genre(_) => NodeLabel::Genre,
            LikeTarget::Actor(_) => NodeLabel::Actor,
            LikeTarget::Item(_) => NodeLabel::Item,
        }
    }
}

impl Display for LikeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikeTarget::Tag(id) => write!(f, "Tag:{}", id),
            LikeTarget::Genre(id) => write!(f, "Genre:{}", id),
            LikeTarget::Actor(id) => write!(f, "Actor:{}", id),
            LikeTarget::Item(id) => write!(f, "Item:{}", id),
        }
    }
}

/// What a comment is attached to: an item, or another comment (threading).
/// The attachment is fixed at creation and never re-parented.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentParent {
    Item(String),
    Comment(i64),
}

impl CommentParent {
    pub fn label(&self) -> NodeLabel {
        match self {
            CommentParent::Item(_) => NodeLabel::Item,
            CommentParent::Comment(_) => NodeLabel::Comment,
        }
    }
}

/// A comment authored by a user
///
/// Repeat writes with the same id overwrite text and timestamp, which is
/// how edits are expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// One entry of a recommendation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub item_id: String,
    pub name: String,
    /// Number of distinct qualifying traversal paths reaching this item
    pub score: i64,
    /// Highest rank among the ratings that contributed a path
    pub rank: i64,
}
