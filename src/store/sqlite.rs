//! SQLite-backed `NumberStore`.
//!
//! One table per logical collection; the phone number is the primary key, which
//! gives the unique index the intake pipeline relies on. Unordered bulk insert
//! maps to `INSERT OR IGNORE` inside a single transaction, so a duplicate key
//! coming from a concurrent intake run is absorbed as "already present".

use super::NumberStore;
use crate::core::error::{AppError, Result};
use crate::core::models::{PhoneRecord, Reachability, RejectedRecord};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_indexes()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_indexes()?;
        Ok(store)
    }

    fn collect_keys(&self, sql: &str) -> Result<HashSet<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = HashSet::new();
        for key in rows {
            keys.insert(key?);
        }
        Ok(keys)
    }
}

impl NumberStore for SqliteStore {
    fn ensure_indexes(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS valid_numbers (
                phone_number TEXT PRIMARY KEY,
                country      TEXT NOT NULL,
                reachability TEXT NOT NULL DEFAULT 'unknown'
            );
            CREATE TABLE IF NOT EXISTS invalid_numbers (
                phone_number TEXT PRIMARY KEY,
                reason       TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn valid_keys(&self) -> Result<HashSet<String>> {
        self.collect_keys("SELECT phone_number FROM valid_numbers")
    }

    fn invalid_keys(&self) -> Result<HashSet<String>> {
        self.collect_keys("SELECT phone_number FROM invalid_numbers")
    }

    fn insert_valid(&self, records: &[PhoneRecord]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO valid_numbers (phone_number, country, reachability)
                 VALUES (?1, ?2, ?3)",
            )?;
            for record in records {
                inserted += stmt.execute(params![
                    record.phone_number,
                    record.country,
                    record.reachability.as_str()
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn insert_invalid(&self, records: &[RejectedRecord]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO invalid_numbers (phone_number, reason) VALUES (?1, ?2)",
            )?;
            for record in records {
                inserted += stmt.execute(params![record.phone_number, record.reason.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn count_valid(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM valid_numbers", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_invalid(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM invalid_numbers", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn valid_by_reachability(&self, reachability: Reachability) -> Result<Vec<PhoneRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT phone_number, country, reachability FROM valid_numbers
             WHERE reachability = ?1 ORDER BY phone_number",
        )?;
        let rows = stmt.query_map(params![reachability.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (phone_number, country, reachability_raw) = row?;
            let reachability = Reachability::parse(&reachability_raw).ok_or_else(|| {
                AppError::Persistence(format!(
                    "Unrecognized reachability value '{}' for {}",
                    reachability_raw, phone_number
                ))
            })?;
            records.push(PhoneRecord {
                phone_number,
                country,
                reachability,
            });
        }
        Ok(records)
    }

    fn set_reachability(&self, phone_number: &str, reachability: Reachability) -> Result<()> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE valid_numbers SET reachability = ?1 WHERE phone_number = ?2",
            params![reachability.as_str(), phone_number],
        )?;
        if updated == 0 {
            return Err(AppError::Persistence(format!(
                "No valid record for key {}",
                phone_number
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::RejectReason;

    #[test]
    fn test_unique_key_enforced_by_insert_or_ignore() {
        let store = SqliteStore::in_memory().unwrap();
        let batch = vec![
            PhoneRecord::new("33612345678", "France"),
            PhoneRecord::new("33612345678", "France"),
        ];
        // In-batch duplicate collapses too
        assert_eq!(store.insert_valid(&batch).unwrap(), 1);
        assert_eq!(store.insert_valid(&batch).unwrap(), 0);
        assert_eq!(store.count_valid().unwrap(), 1);
    }

    #[test]
    fn test_key_sets_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_invalid(&[RejectedRecord {
                phone_number: "notaphone".to_string(),
                reason: RejectReason::InvalidFormat,
            }])
            .unwrap();
        assert!(store.invalid_keys().unwrap().contains("notaphone"));
        assert!(store.valid_keys().unwrap().is_empty());
    }

    #[test]
    fn test_reachability_lifecycle() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_valid(&[
                PhoneRecord::new("33611111111", "France"),
                PhoneRecord::new("33622222222", "France"),
            ])
            .unwrap();

        store
            .set_reachability("33611111111", Reachability::Reachable)
            .unwrap();

        let unknown = store.valid_by_reachability(Reachability::Unknown).unwrap();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].phone_number, "33622222222");

        let reachable = store
            .valid_by_reachability(Reachability::Reachable)
            .unwrap();
        assert_eq!(reachable.len(), 1);

        assert!(store
            .set_reachability("33699999999", Reachability::Unreachable)
            .is_err());
    }
}
