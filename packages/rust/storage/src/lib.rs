//! Turso Embedded / libSQL storage layer.
//!
//! The [`Storage`] struct wraps a libSQL database holding the one record CheckIO
//! owns: the featured category configuration. Everything else lives upstream.
//!
//! The record sits in a table whose primary key may only take the value
//! `'featured'`, so the storage engine itself enforces the single row. Reads
//! create it with defaults on first access; writes upsert onto the same key.

mod migrations;

use std::path::Path;

use chrono::Utc;
use checkio_shared::{AssignmentMode, CategoryId, CheckIoError, FeaturedCategoryConfig, Result};
use libsql::{Connection, Database, params};

/// Fixed key of the featured category row.
const FEATURED_SLOT: &str = "featured";

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Read/write access to the featured category configuration.
///
/// The aggregation pipeline receives an implementation at construction.
pub trait CategoryConfigStore: Send + Sync {
    /// Return the singleton, creating it with defaults if absent.
    fn load(&self) -> impl Future<Output = Result<FeaturedCategoryConfig>> + Send;

    /// Overwrite the singleton with `config`.
    fn save(&self, config: &FeaturedCategoryConfig) -> impl Future<Output = Result<()>> + Send;
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`, applying pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CheckIoError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| CheckIoError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| CheckIoError::Storage(e.to_string()))?;

        // PRAGMA busy_timeout answers with a row, so it goes through query() and is stepped once.
        let mut pragma = conn
            .query(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"), ())
            .await
            .map_err(|e| CheckIoError::Storage(format!("failed to set busy timeout: {e}")))?;
        pragma
            .next()
            .await
            .map_err(|e| CheckIoError::Storage(format!("failed to set busy timeout: {e}")))?;
        drop(pragma);

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        CheckIoError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Featured category configuration
    // -----------------------------------------------------------------------

    /// Load the featured category configuration, inserting defaults on first use.
    pub async fn load_featured_config(&self) -> Result<FeaturedCategoryConfig> {
        let now = Utc::now().to_rfc3339();
        let inserted = self
            .conn
            .execute(
                "INSERT INTO featured_category_config (slot, mode, allowed_category_ids, updated_at)
                 VALUES (?1, ?2, '[]', ?3)
                 ON CONFLICT(slot) DO NOTHING",
                params![FEATURED_SLOT, AssignmentMode::default().as_str(), now.as_str()],
            )
            .await
            .map_err(|e| CheckIoError::Storage(e.to_string()))?;

        if inserted > 0 {
            tracing::info!("created default featured category configuration");
        }

        let mut rows = self
            .conn
            .query(
                "SELECT mode, allowed_category_ids FROM featured_category_config WHERE slot = ?1",
                params![FEATURED_SLOT],
            )
            .await
            .map_err(|e| CheckIoError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_featured_config(&row),
            Ok(None) => Err(CheckIoError::Storage(
                "featured category row missing after insert".into(),
            )),
            Err(e) => Err(CheckIoError::Storage(e.to_string())),
        }
    }

    /// Write the featured category configuration onto the singleton row.
    ///
    /// Rewriting identical values leaves the row, including `updated_at`, untouched.
    pub async fn save_featured_config(&self, config: &FeaturedCategoryConfig) -> Result<()> {
        let ids = serde_json::to_string(&config.allowed_category_ids)
            .map_err(|e| CheckIoError::Storage(format!("failed to encode category ids: {e}")))?;
        let now = Utc::now().to_rfc3339();

        let changed = self
            .conn
            .execute(
                "INSERT INTO featured_category_config (slot, mode, allowed_category_ids, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(slot) DO UPDATE SET
                   mode = excluded.mode,
                   allowed_category_ids = excluded.allowed_category_ids,
                   updated_at = excluded.updated_at
                 WHERE featured_category_config.mode IS NOT excluded.mode
                    OR featured_category_config.allowed_category_ids IS NOT excluded.allowed_category_ids",
                params![FEATURED_SLOT, config.mode.as_str(), ids.as_str(), now.as_str()],
            )
            .await
            .map_err(|e| CheckIoError::Storage(e.to_string()))?;

        tracing::debug!(
            mode = %config.mode,
            categories = config.allowed_category_ids.len(),
            changed,
            "saved featured category configuration"
        );
        Ok(())
    }

    /// When the configuration last changed, or `None` before the first load.
    pub async fn featured_config_updated_at(&self) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT updated_at FROM featured_category_config WHERE slot = ?1",
                params![FEATURED_SLOT],
            )
            .await
            .map_err(|e| CheckIoError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<String>(0)
                    .map_err(|e| CheckIoError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(CheckIoError::Storage(e.to_string())),
        }
    }
}

impl CategoryConfigStore for Storage {
    async fn load(&self) -> Result<FeaturedCategoryConfig> {
        self.load_featured_config().await
    }

    async fn save(&self, config: &FeaturedCategoryConfig) -> Result<()> {
        self.save_featured_config(config).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_featured_config(row: &libsql::Row) -> Result<FeaturedCategoryConfig> {
    let mode: String = row
        .get(0)
        .map_err(|e| CheckIoError::Storage(e.to_string()))?;
    let ids_json: String = row
        .get(1)
        .map_err(|e| CheckIoError::Storage(e.to_string()))?;

    let mode = mode
        .parse::<AssignmentMode>()
        .map_err(|e| CheckIoError::Storage(format!("stored mode is corrupt: {e}")))?;
    let allowed_category_ids: Vec<CategoryId> = serde_json::from_str(&ids_json)
        .map_err(|e| CheckIoError::Storage(format!("stored category ids are corrupt: {e}")))?;

    Ok(FeaturedCategoryConfig {
        mode,
        allowed_category_ids,
    })
}
