use std::sync::Arc;

use crate::{
    db::{GraphStore, MergeOutcome},
    error::{AppError, AppResult},
    models::CatalogItem,
};

/// Trait for the external catalog/document store
///
/// The document store owns item metadata and free-text search; this engine
/// only consumes it. Implementations live with the process wiring, outside
/// this crate.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search items by free-text query
    async fn search_items(&self, query: &str) -> AppResult<Vec<CatalogItem>>;

    /// Fetch every item, for catalog sync and listings
    async fn all_items(&self) -> AppResult<Vec<CatalogItem>>;

    /// Fetch a random sample of items for listings
    async fn random_items(&self, count: usize) -> AppResult<Vec<CatalogItem>>;
}

/// Service function for item search
///
/// Delegates to the configured CatalogProvider, maintaining a clean
/// separation between transport glue and business logic.
pub async fn search_items(
    catalog: Arc<dyn CatalogProvider>,
    query: &str,
) -> AppResult<Vec<CatalogItem>> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    catalog.search_items(query).await
}

/// Counts reported by a catalog sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub items: usize,
    pub tags: usize,
}

/// Mirrors the catalog into the graph so interaction edges have their
/// counterpart nodes.
///
/// Items and their tags must be present before any recorder call that
/// references them; an edge upsert against an unsynced item is a NotFound,
/// never an implicit creation.
pub struct CatalogSync {
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<dyn GraphStore>,
}

impl CatalogSync {
    pub fn new(catalog: Arc<dyn CatalogProvider>, store: Arc<dyn GraphStore>) -> Self {
        Self { catalog, store }
    }

    /// Upserts every catalog item and its tags into the graph.
    pub async fn sync_all(&self) -> AppResult<SyncReport> {
        let items = self.catalog.all_items().await?;

        let mut report = SyncReport { items: 0, tags: 0 };
        for item in &items {
            self.store.upsert_item(&item.id, &item.name).await?;
            report.items += 1;

            for item_tag in &item.tags {
                match self.store.upsert_item_tag(&item.id, item_tag).await? {
                    MergeOutcome::Applied => report.tags += 1,
                    MergeOutcome::NoMatch => {
                        tracing::warn!(
                            item_id = %item.id,
                            tag_id = item_tag.id,
                            "Tag upsert matched no item"
                        );
                    }
                }
            }
        }

        tracing::info!(
            items = report.items,
            tags = report.tags,
            "Catalog sync completed"
        );
        Ok(report)
    }
}
