pub mod catalog;
pub mod graph;
pub mod user;

pub use catalog::{CatalogItem, Tag};
pub use graph::{
    validate_rank, Comment, CommentParent, EdgeKind, LikeTarget, NodeLabel, Rating,
    RecommendedItem, RANK_SCALE,
};
pub use user::UserProfile;
