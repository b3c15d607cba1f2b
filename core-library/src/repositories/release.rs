//! Release repository trait and implementation

use crate::error::Result;
use crate::models::{AttributeKind, AttributeWriteMode, Release, StoreOutcome};
use async_trait::async_trait;
use sqlx::{query, query_scalar, SqlitePool};
use tracing::{debug, instrument};

/// Release repository interface for data access operations
#[async_trait]
pub trait ReleaseRepository: Send + Sync {
    /// Persist a release and its attributes in one transaction
    ///
    /// The release row is inserted only if no row with the same id exists.
    /// Attribute rows are then written according to the repository's
    /// [`AttributeWriteMode`]. Either everything is committed or nothing is.
    ///
    /// # Errors
    /// Returns error if:
    /// - Release validation fails
    /// - Any statement fails (the transaction is rolled back)
    async fn store(&self, release: &Release) -> Result<StoreOutcome>;

    /// Find a release by its upstream id
    ///
    /// Attribute lists come back in insertion order.
    async fn find_by_id(&self, id: i64) -> Result<Option<Release>>;

    /// Check whether a release row exists
    async fn exists(&self, id: i64) -> Result<bool>;

    /// Count stored releases
    async fn count(&self) -> Result<i64>;

    /// Delete a release; attribute rows cascade
    ///
    /// # Returns
    /// - `Ok(true)` if the release was deleted
    /// - `Ok(false)` if it was not found
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLite implementation of ReleaseRepository
pub struct SqliteReleaseRepository {
    pool: SqlitePool,
    mode: AttributeWriteMode,
}

impl SqliteReleaseRepository {
    /// Create a repository that appends attribute rows
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_mode(pool, AttributeWriteMode::default())
    }

    pub fn with_mode(pool: SqlitePool, mode: AttributeWriteMode) -> Self {
        Self { pool, mode }
    }

    pub fn mode(&self) -> AttributeWriteMode {
        self.mode
    }

    async fn load_attributes(&self, id: i64, kind: AttributeKind) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT name FROM {} WHERE release_id = ? ORDER BY id ASC",
            kind.table_name()
        );

        let names = query_scalar::<_, String>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }
}

#[async_trait]
impl ReleaseRepository for SqliteReleaseRepository {
    #[instrument(skip(self, release), fields(release_id = release.id()))]
    async fn store(&self, release: &Release) -> Result<StoreOutcome> {
        // Dropping the transaction without commit rolls it back
        let mut tx = self.pool.begin().await?;

        let created = query("INSERT INTO releases (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(release.id())
            .execute(&mut *tx)
            .await?
            .rows_affected()
            == 1;

        let mut attributes_replaced = 0;
        if self.mode == AttributeWriteMode::Replace && !created {
            for kind in AttributeKind::WRITE_ORDER {
                let sql = format!("DELETE FROM {} WHERE release_id = ?", kind.table_name());
                attributes_replaced += query(&sql)
                    .bind(release.id())
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
            }
        }

        let mut attributes_written = 0;
        for kind in AttributeKind::WRITE_ORDER {
            let sql = format!(
                "INSERT INTO {} (release_id, name) VALUES (?, ?)",
                kind.table_name()
            );

            for name in release.attributes(kind) {
                attributes_written += query(&sql)
                    .bind(release.id())
                    .bind(name)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
            }
        }

        tx.commit().await?;

        debug!(
            created,
            attributes_written, attributes_replaced, "Release committed"
        );

        Ok(StoreOutcome {
            release_id: release.id(),
            created,
            attributes_written,
            attributes_replaced,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Release>> {
        if !self.exists(id).await? {
            return Ok(None);
        }

        let artists = self.load_attributes(id, AttributeKind::Artist).await?;
        let styles = self.load_attributes(id, AttributeKind::Style).await?;
        let genres = self.load_attributes(id, AttributeKind::Genre).await?;

        Ok(Some(Release::new(id, artists, styles, genres)))
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let found = query_scalar::<_, i64>("SELECT id FROM releases WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    async fn count(&self) -> Result<i64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM releases")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = query("DELETE FROM releases WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
