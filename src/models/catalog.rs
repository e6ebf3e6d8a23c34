use serde::{Deserialize, Serialize};

/// A tag as known to both the catalog and the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// An item record as returned by the external catalog/document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<Tag>,
    pub release_date: Option<String>,
}
