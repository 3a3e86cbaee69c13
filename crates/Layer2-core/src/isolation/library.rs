//! SQLite 기반 단열재 라이브러리

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::entry::{IsolationCriteria, IsolationEntry, IsolationKey};
use crate::plugin::guard::guarded;
use heatrix_foundation::{Error, Result};

/// Current schema version
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// upsert 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// 기존 엔트리에 메타데이터 병합
    Merged,
}

/// 리스너 구독 id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

/// 공유 단열재 라이브러리
pub struct IsolationLibrary {
    conn: Mutex<Connection>,
    listeners: Mutex<Listeners>,
}

impl std::fmt::Debug for IsolationLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolationLibrary")
            .field("listeners", &self.listeners.lock().entries.len())
            .finish_non_exhaustive()
    }
}

impl IsolationLibrary {
    /// 파일 DB 열기
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("Failed to create data directory: {}", e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open database: {}", e)))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| Error::Storage(format!("Failed to set pragmas: {}", e)))?;

        Self::with_connection(conn)
    }

    /// 인메모리 DB (테스트)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            Error::Storage(format!("Failed to create in-memory database: {}", e))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        initialize_schema(&conn)?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            listeners: Mutex::new(Listeners::default()),
        })
    }

    pub fn schema_version(&self) -> Result<i32> {
        schema_version(&self.conn.lock())
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 조건 검색 (재료, 두께 순)
    pub fn find(&self, criteria: &IsolationCriteria) -> Result<Vec<IsolationEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT material, thickness_mm, metadata FROM isolation_entries
             ORDER BY key_material, thickness_mm",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (material, thickness_mm, metadata) = row?;
            let entry = IsolationEntry {
                material,
                thickness_mm,
                metadata: parse_metadata(&metadata),
            };
            if criteria.matches(&entry) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// 키로 조회
    pub fn get(&self, key: &IsolationKey) -> Result<Option<IsolationEntry>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT material, thickness_mm, metadata FROM isolation_entries WHERE key = ?1",
                params![key.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(material, thickness_mm, metadata)| IsolationEntry {
            material,
            thickness_mm,
            metadata: parse_metadata(&metadata),
        }))
    }

    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM isolation_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // ========================================================================
    // 변경
    // ========================================================================

    /// 삽입 또는 병합
    ///
    /// 같은 키가 있으면 들어온 메타데이터 키가 덮어쓰고 없는 키는 유지된다.
    /// 표시용 재료명은 새 값으로 바뀐다.
    pub fn upsert(&self, entry: IsolationEntry) -> Result<UpsertOutcome> {
        let key = entry.key()?;
        let now = Utc::now().to_rfc3339();

        let outcome = {
            let mut conn = self.conn.lock();
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT metadata FROM isolation_entries WHERE key = ?1",
                    params![key.to_string()],
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = match existing {
                Some(existing) => {
                    let mut merged = parse_metadata(&existing);
                    merged.extend(entry.metadata.clone());
                    let merged = IsolationEntry {
                        metadata: merged,
                        ..entry.clone()
                    };

                    tx.execute(
                        "UPDATE isolation_entries
                         SET material = ?2, metadata = ?3, updated_at = ?4
                         WHERE key = ?1",
                        params![key.to_string(), merged.material, merged.metadata_json()?, now],
                    )?;
                    UpsertOutcome::Merged
                }
                None => {
                    tx.execute(
                        "INSERT INTO isolation_entries
                         (key, key_material, material, thickness_mm, metadata, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                        params![
                            key.to_string(),
                            key.material(),
                            entry.material,
                            key.thickness_mm(),
                            entry.metadata_json()?,
                            now
                        ],
                    )?;
                    UpsertOutcome::Inserted
                }
            };

            tx.commit()?;
            outcome
        };

        debug!("Isolation upsert {} -> {:?}", key, outcome);
        self.notify();
        Ok(outcome)
    }

    /// 삭제. 없던 키면 false
    pub fn remove(&self, key: &IsolationKey) -> Result<bool> {
        let removed = {
            let conn = self.conn.lock();
            conn.execute(
                "DELETE FROM isolation_entries WHERE key = ?1",
                params![key.to_string()],
            )?
        };

        if removed > 0 {
            debug!("Isolation remove {}", key);
            self.notify();
        }
        Ok(removed > 0)
    }

    // ========================================================================
    // 리스너
    // ========================================================================

    /// 변경 알림 구독
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        listeners.next_id += 1;
        let id = SubscriptionId(listeners.next_id);
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.entries.len();
        listeners.entries.retain(|(sid, _)| *sid != id);
        listeners.entries.len() != before
    }

    /// 락 밖에서 호출 (리스너가 라이브러리를 다시 읽을 수 있음)
    fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in snapshot {
            if let Err(message) = guarded(|| listener()) {
                warn!("Isolation listener panicked: {}", message);
            }
        }
    }
}

fn parse_metadata(raw: &str) -> BTreeMap<String, Value> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Ignoring unreadable isolation metadata: {}", e);
        BTreeMap::new()
    })
}

// ============================================================================
// Schema
// ============================================================================

fn schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| Error::Storage(format!("Failed to get schema version: {}", e)))
}

fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS isolation_entries (
            key TEXT PRIMARY KEY,
            key_material TEXT NOT NULL,
            material TEXT NOT NULL,
            thickness_mm REAL NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_isolation_material
            ON isolation_entries(key_material, thickness_mm);

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )
    .map_err(|e| Error::Storage(format!("Failed to initialize schema: {}", e)))
}

fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = schema_version(conn)?;

    if current_version >= CURRENT_SCHEMA_VERSION {
        debug!("Isolation schema is up to date (version {})", current_version);
        return Ok(());
    }

    info!(
        "Running isolation migrations from version {} to {}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    for version in (current_version + 1)..=CURRENT_SCHEMA_VERSION {
        match version {
            2 => migrate_v2(conn)?,
            _ => warn!("Unknown migration version: {}", version),
        }

        conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![version],
        )
        .map_err(|e| Error::Storage(format!("Failed to record migration: {}", e)))?;

        info!("Applied isolation migration to version {}", version);
    }

    Ok(())
}

/// Version 2: 생성 시각 기록
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute(
        "ALTER TABLE isolation_entries ADD COLUMN created_at TEXT",
        [],
    )
    .map_err(|e| Error::Storage(format!("Failed to migrate to version 2: {}", e)))?;
    conn.execute(
        "UPDATE isolation_entries SET created_at = updated_at WHERE created_at IS NULL",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[test]
    fn test_schema_migrated() {
        let lib = IsolationLibrary::in_memory().unwrap();
        assert_eq!(lib.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_upsert_insert_then_merge() {
        let lib = IsolationLibrary::in_memory().unwrap();

        let outcome = lib
            .upsert(
                IsolationEntry::new("Mineralwolle", 100.0)
                    .with("lambda", 0.035)
                    .with("supplier", "A"),
            )
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let outcome = lib
            .upsert(IsolationEntry::new("  MINERALWOLLE ", 100.0).with("lambda", 0.032))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Merged);
        assert_eq!(lib.len().unwrap(), 1);

        let key = IsolationKey::new("mineralwolle", 100.0).unwrap();
        let entry = lib.get(&key).unwrap().unwrap();
        assert_eq!(entry.material, "  MINERALWOLLE ");
        assert_eq!(entry.number("lambda"), Some(0.032));
        assert_eq!(entry.metadata.get("supplier"), Some(&json!("A")));
    }

    #[test]
    fn test_upsert_validation() {
        let lib = IsolationLibrary::in_memory().unwrap();
        assert!(matches!(
            lib.upsert(IsolationEntry::new("", 10.0)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            lib.upsert(IsolationEntry::new("PUR", f64::INFINITY)),
            Err(Error::Validation(_))
        ));
        assert!(lib.is_empty().unwrap());
    }

    #[test]
    fn test_find_and_remove() {
        let lib = IsolationLibrary::in_memory().unwrap();
        lib.upsert(IsolationEntry::new("PUR", 60.0).with("lambda", 0.024))
            .unwrap();
        lib.upsert(IsolationEntry::new("Mineralwolle", 80.0).with("lambda", 0.035))
            .unwrap();
        lib.upsert(IsolationEntry::new("Mineralwolle", 120.0).with("lambda", 0.035))
            .unwrap();

        let all = lib.find(&IsolationCriteria::any()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].material, "Mineralwolle");
        assert_eq!(all[0].thickness_mm, 80.0);

        let thick = lib
            .find(&IsolationCriteria::any().material("wolle").thickness_between(100.0, 200.0))
            .unwrap();
        assert_eq!(thick.len(), 1);

        let key = IsolationKey::new("pur", 60.0).unwrap();
        assert!(lib.remove(&key).unwrap());
        assert!(!lib.remove(&key).unwrap());
        assert!(lib.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_listeners_notified_and_panics_contained() {
        let lib = IsolationLibrary::in_memory().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let id = lib.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        lib.subscribe(|| panic!("listener bug"));

        lib.upsert(IsolationEntry::new("PUR", 60.0)).unwrap();
        lib.remove(&IsolationKey::new("pur", 60.0).unwrap()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(lib.unsubscribe(id));
        lib.upsert(IsolationEntry::new("PUR", 80.0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_persisted_on_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("isolation.db");
        {
            let lib = IsolationLibrary::open(&path).unwrap();
            lib.upsert(IsolationEntry::new("XPS", 40.0).with("lambda", 0.033))
                .unwrap();
        }

        let lib = IsolationLibrary::open(&path).unwrap();
        assert_eq!(lib.len().unwrap(), 1);
        assert_eq!(lib.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }
}
