//! libSQL-backed order store.
//!
//! The [`Storage`] struct wraps a local libSQL database holding ingested
//! executive orders. The ingestion pipeline talks to it through the
//! [`OrderStore`] trait.
//!
//! **Access rules:**
//! - Collection runs: read-write via [`Storage::open`]
//! - Reporting commands: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use ordertrack_shared::{OrderRecord, OrderTrackError, Result};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// The store operations the ingestion pipeline depends on.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Find a record whose title matches exactly.
    async fn find_by_title(&self, title: &str) -> Result<Option<OrderRecord>>;

    /// Persist a new record. Returns the generated record ID.
    async fn insert_order(&self, record: &OrderRecord) -> Result<String>;

    /// The record with the greatest `created_at`, if any.
    async fn most_recent(&self) -> Result<Option<OrderRecord>>;
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Primary storage handle wrapping a libSQL database.
///
/// The connection is released when the handle is dropped.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

const ORDER_COLUMNS: &str = "title, link, created_at, order_date, content, source";

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OrderTrackError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| OrderTrackError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| OrderTrackError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        tracing::debug!(path = %path.display(), "order store opened");
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(OrderTrackError::Storage(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| OrderTrackError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| OrderTrackError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
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
                        OrderTrackError::Storage(format!(
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

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(OrderTrackError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Order operations
    // -----------------------------------------------------------------------

    /// Look up an order by exact title.
    pub async fn find_order_by_title(&self, title: &str) -> Result<Option<OrderRecord>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE title = ?1 LIMIT 1");
        let mut rows = self
            .conn
            .query(&sql, params![title])
            .await
            .map_err(|e| OrderTrackError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_order(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(OrderTrackError::Storage(e.to_string())),
        }
    }

    /// Insert an order. Returns the generated ID.
    pub async fn insert(&self, record: &OrderRecord) -> Result<String> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        self.conn
            .execute(
                "INSERT INTO orders (id, title, link, created_at, order_date, content, source)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.as_str(),
                    record.title.as_str(),
                    record.link.as_str(),
                    format_created_at(&record.created_at),
                    record.order_date.to_rfc3339(),
                    record.content.as_str(),
                    record.source.as_str(),
                ],
            )
            .await
            .map_err(|e| OrderTrackError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// The `limit` most recently ingested orders, newest first.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<OrderRecord>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        );
        let mut rows = self
            .conn
            .query(&sql, params![i64::from(limit)])
            .await
            .map_err(|e| OrderTrackError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_order(&row)?);
        }
        Ok(results)
    }

    /// Total number of stored orders.
    pub async fn count_orders(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM orders", params![])
            .await
            .map_err(|e| OrderTrackError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| OrderTrackError::Storage(e.to_string()))?;
                Ok(count.max(0) as u64)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(OrderTrackError::Storage(e.to_string())),
        }
    }
}

impl OrderStore for Storage {
    async fn find_by_title(&self, title: &str) -> Result<Option<OrderRecord>> {
        self.find_order_by_title(title).await
    }

    async fn insert_order(&self, record: &OrderRecord) -> Result<String> {
        self.insert(record).await
    }

    async fn most_recent(&self) -> Result<Option<OrderRecord>> {
        Ok(self.list_recent(1).await?.into_iter().next())
    }
}

/// Fixed-width UTC form so lexical order in SQL matches chronological order.
fn format_created_at(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Convert a database row to an [`OrderRecord`].
fn row_to_order(row: &libsql::Row) -> Result<OrderRecord> {
    let text = |idx: i32| -> Result<String> {
        row.get::<String>(idx)
            .map_err(|e| OrderTrackError::Storage(e.to_string()))
    };

    let created_at = {
        let s = text(2)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| OrderTrackError::Storage(format!("invalid created_at '{s}': {e}")))?
    };
    let order_date = {
        let s = text(3)?;
        DateTime::parse_from_rfc3339(&s)
            .map_err(|e| OrderTrackError::Storage(format!("invalid order_date '{s}': {e}")))?
    };

    Ok(OrderRecord {
        title: text(0)?,
        link: text(1)?,
        created_at,
        order_date,
        content: text(4)?,
        source: text(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound, TimeZone};

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("ot_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn order(title: &str, created_at: DateTime<Utc>) -> OrderRecord {
        OrderRecord {
            title: title.into(),
            link: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
            created_at,
            order_date: DateTime::parse_from_rfc3339("2025-01-20T11:00:00-05:00").unwrap(),
            content: "First paragraph.\n\nSecond paragraph.".into(),
            source: "whitehouse.gov".into(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("ot_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn insert_and_find_by_title_roundtrip() {
        let storage = test_storage().await;
        let record = order("Ending Radical Programs", Utc::now().trunc_subsecs(6));

        let id = storage.insert_order(&record).await.expect("insert");
        assert!(!id.is_empty());

        let found = storage
            .find_by_title("Ending Radical Programs")
            .await
            .expect("find")
            .expect("record present");
        assert_eq!(found, record);
        assert_eq!(found.order_date.offset().local_minus_utc(), -5 * 3600);

        let missing = storage.find_by_title("Ending Radical").await.expect("find");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn empty_content_is_stored() {
        let storage = test_storage().await;
        let record = OrderRecord {
            content: String::new(),
            ..order("No Body", Utc::now().trunc_subsecs(6))
        };
        storage.insert_order(&record).await.expect("insert");
        let found = storage.find_by_title("No Body").await.unwrap().unwrap();
        assert_eq!(found.content, "");
    }

    #[tokio::test]
    async fn most_recent_uses_created_at_not_insertion_order() {
        let storage = test_storage().await;
        assert!(storage.most_recent().await.unwrap().is_none());

        let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        storage.insert_order(&order("Middle", base)).await.unwrap();
        storage
            .insert_order(&order("Newest", base + Duration::hours(5)))
            .await
            .unwrap();
        storage
            .insert_order(&order("Oldest", base - Duration::days(3)))
            .await
            .unwrap();

        let latest = storage.most_recent().await.unwrap().unwrap();
        assert_eq!(latest.title, "Newest");

        let recent = storage.list_recent(10).await.unwrap();
        let titles: Vec<_> = recent.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);
        assert_eq!(storage.count_orders().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn duplicate_titles_are_not_rejected_by_the_store() {
        let storage = test_storage().await;
        let now = Utc::now().trunc_subsecs(6);
        storage.insert_order(&order("Same", now)).await.unwrap();
        storage.insert_order(&order("Same", now)).await.unwrap();
        assert_eq!(storage.count_orders().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("ot_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.insert_order(&order("Existing", Utc::now())).await.unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert_eq!(ro.count_orders().await.unwrap(), 1);
        let result = ro.insert_order(&order("Another", Utc::now())).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_file() {
        let tmp = std::env::temp_dir().join(format!("ot_missing_{}.db", Uuid::now_v7()));
        assert!(Storage::open_readonly(&tmp).await.is_err());
    }
}
