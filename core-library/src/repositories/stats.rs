//! Aggregate queries over stored releases

use crate::error::Result;
use crate::models::{AttributeKind, CountResult, ReleaseFilter};
use async_trait::async_trait;
use sqlx::{query_as, query_scalar, SqlitePool};

const ALL_KINDS: [AttributeKind; 3] = [
    AttributeKind::Artist,
    AttributeKind::Style,
    AttributeKind::Genre,
];

/// Read-side repository for catalog statistics
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Count releases matching every filter in `filter`
    ///
    /// A release matches a filter when at least one of its attribute rows of
    /// that kind contains the filter value, ignoring ASCII case. The
    /// per-name maps count distinct matching releases; for a filtered kind
    /// only names that themselves match the filter are reported.
    async fn release_counts(&self, filter: &ReleaseFilter) -> Result<CountResult>;

    /// Distinct names of one attribute kind, sorted ascending
    async fn unique_names(&self, kind: AttributeKind) -> Result<Vec<String>>;
}

/// SQLite implementation of StatsRepository
pub struct SqliteStatsRepository {
    pool: SqlitePool,
}

impl SqliteStatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Wrap a user value in `%...%`, escaping LIKE wildcards
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `WHERE` fragment selecting releases that satisfy the filter, with its binds
fn release_conditions(filter: &ReleaseFilter) -> (String, Vec<String>) {
    let mut conditions = String::from("1 = 1");
    let mut binds = Vec::new();

    for kind in ALL_KINDS {
        if let Some(value) = filter.for_kind(kind) {
            conditions.push_str(&format!(
                r" AND EXISTS (SELECT 1 FROM {} f WHERE f.release_id = r.id AND f.name LIKE ? ESCAPE '\')",
                kind.table_name()
            ));
            binds.push(like_pattern(value));
        }
    }

    (conditions, binds)
}

#[async_trait]
impl StatsRepository for SqliteStatsRepository {
    async fn release_counts(&self, filter: &ReleaseFilter) -> Result<CountResult> {
        let (conditions, binds) = release_conditions(filter);

        let count_sql = format!("SELECT COUNT(*) FROM releases r WHERE {}", conditions);
        let mut count_query = query_scalar::<_, i64>(&count_sql);
        for bind in &binds {
            count_query = count_query.bind(bind);
        }
        let release_count = count_query.fetch_one(&self.pool).await?;

        let mut result = CountResult {
            release_count: release_count as u64,
            ..CountResult::default()
        };

        for kind in ALL_KINDS {
            let own_filter = filter.for_kind(kind).map(like_pattern);
            let sql = format!(
                r"SELECT t.name, COUNT(DISTINCT t.release_id)
                FROM {table} t
                WHERE t.release_id IN (SELECT r.id FROM releases r WHERE {conditions})
                {name_filter}
                GROUP BY t.name",
                table = kind.table_name(),
                conditions = conditions,
                name_filter = if own_filter.is_some() {
                    r"AND t.name LIKE ? ESCAPE '\'"
                } else {
                    ""
                },
            );

            let mut name_query = query_as::<_, (String, i64)>(&sql);
            for bind in &binds {
                name_query = name_query.bind(bind);
            }
            if let Some(ref pattern) = own_filter {
                name_query = name_query.bind(pattern);
            }

            let rows = name_query.fetch_all(&self.pool).await?;
            let counts = result.counts_mut(kind);
            for (name, count) in rows {
                counts.insert(name, count as u64);
            }
        }

        Ok(result)
    }

    async fn unique_names(&self, kind: AttributeKind) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT name FROM {} ORDER BY name ASC",
            kind.table_name()
        );

        let names = query_scalar::<_, String>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }
}
