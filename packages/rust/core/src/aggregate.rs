//! Featured asset aggregation: one upstream query per featured category,
//! merged, deduplicated by asset id, and projected for display.

use std::collections::HashSet;

use checkio_directory::{AssetDirectory, HardwareQuery};
use checkio_shared::{CategoryId, DisplayPropertySpec, ProjectedAsset, Result};
use checkio_storage::CategoryConfigStore;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::projection::{asset_id, column_headers, project_asset};

/// Default page size for each per-category hardware query.
pub const DEFAULT_PAGE_LIMIT: u32 = 500;

/// A featured category whose fetch failed. Its assets are missing from the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryWarning {
    pub category_id: CategoryId,
    pub message: String,
}

impl std::fmt::Display for CategoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "could not fetch assets for category {}: {}",
            self.category_id, self.message
        )
    }
}

/// Informational outcomes that are not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListNotice {
    NoCategoriesConfigured,
}

impl ListNotice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoCategoriesConfigured => "No featured categories are configured.",
        }
    }
}

/// Result of [`AggregationPipeline::build_featured_asset_list`].
#[derive(Debug, Clone, Serialize)]
pub struct FeaturedAssetList {
    pub columns: Vec<String>,
    pub rows: Vec<ProjectedAsset>,
    pub warnings: Vec<CategoryWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<ListNotice>,
    /// Upstream records dropped because they carried no integer id.
    pub skipped_without_id: usize,
}

/// Progress callback for reporting aggregation status.
pub trait AggregationProgress: Send + Sync {
    /// Called before each category query.
    fn category_started(&self, category_id: CategoryId, current: usize, total: usize);
    /// Called when a category query fails.
    fn category_failed(&self, warning: &CategoryWarning);
    /// Called when the list is complete.
    fn done(&self, list: &FeaturedAssetList);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl AggregationProgress for SilentProgress {
    fn category_started(&self, _category_id: CategoryId, _current: usize, _total: usize) {}
    fn category_failed(&self, _warning: &CategoryWarning) {}
    fn done(&self, _list: &FeaturedAssetList) {}
}

/// Builds the featured asset listing from an injected store and directory.
pub struct AggregationPipeline<'a, S, D> {
    store: &'a S,
    directory: &'a D,
    display: &'a [DisplayPropertySpec],
    page_limit: u32,
}

impl<'a, S, D> AggregationPipeline<'a, S, D>
where
    S: CategoryConfigStore,
    D: AssetDirectory,
{
    pub fn new(store: &'a S, directory: &'a D, display: &'a [DisplayPropertySpec]) -> Self {
        Self {
            store,
            directory,
            display,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Build the deduplicated, projected list of assets in featured categories.
    ///
    /// 1. Load the featured configuration (storage failures are fatal)
    /// 2. Query each distinct category once, in configured order
    /// 3. Keep the first record seen for each asset id
    /// 4. Project the survivors
    ///
    /// A failed category query becomes a warning and contributes no rows.
    #[instrument(skip_all)]
    pub async fn build_featured_asset_list(
        &self,
        progress: &dyn AggregationProgress,
    ) -> Result<FeaturedAssetList> {
        let config = self.store.load().await?;
        let columns = column_headers(self.display);
        let categories = config.distinct_category_ids();

        if categories.is_empty() {
            info!("no featured categories configured");
            let list = FeaturedAssetList {
                columns,
                rows: Vec::new(),
                warnings: Vec::new(),
                notice: Some(ListNotice::NoCategoriesConfigured),
                skipped_without_id: 0,
            };
            progress.done(&list);
            return Ok(list);
        }

        info!(categories = categories.len(), mode = %config.mode, "aggregating featured assets");

        let mut seen: HashSet<i64> = HashSet::new();
        let mut rows = Vec::new();
        let mut warnings = Vec::new();
        let mut skipped_without_id = 0usize;

        for (index, category_id) in categories.iter().copied().enumerate() {
            progress.category_started(category_id, index + 1, categories.len());

            let query = HardwareQuery::new(category_id, self.page_limit);
            let page = match self.directory.list_hardware_by_category(&query).await {
                Ok(page) => page,
                Err(e) => {
                    let warning = CategoryWarning {
                        category_id,
                        message: e.to_string(),
                    };
                    warn!(%category_id, error = %e, "category fetch failed, continuing");
                    progress.category_failed(&warning);
                    warnings.push(warning);
                    continue;
                }
            };

            if page.total > page.rows.len() as u64 {
                warn!(
                    %category_id,
                    fetched = page.rows.len(),
                    total = page.total,
                    "category listing truncated at page limit"
                );
            }

            for record in &page.rows {
                let Some(id) = asset_id(record) else {
                    skipped_without_id += 1;
                    debug!(%category_id, "dropping record without an id");
                    continue;
                };
                if !seen.insert(id) {
                    debug!(%category_id, asset_id = id, "dropping duplicate asset");
                    continue;
                }
                if let Some(row) = project_asset(record, self.display) {
                    rows.push(row);
                }
            }
        }

        let list = FeaturedAssetList {
            columns,
            rows,
            warnings,
            notice: None,
            skipped_without_id,
        };

        info!(
            assets = list.rows.len(),
            warnings = list.warnings.len(),
            skipped_without_id = list.skipped_without_id,
            "featured asset list built"
        );
        progress.done(&list);
        Ok(list)
    }
}
