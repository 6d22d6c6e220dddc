// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;

use crate::error::Fallible;
use crate::store::KeyValueStore;
use crate::types::timestamp::Timestamp;

/// SQLite-backed key-value store for resume records.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }

    /// Return every key that starts with `prefix`, in key order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Fallible<Vec<String>> {
        let sql = "select key from entries where substr(key, 1, length(?1)) = ?1 order by key;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([prefix])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            keys.push(key);
        }
        Ok(keys)
    }

    /// The most recent write to any key that starts with `prefix`.
    pub fn last_updated(&self, prefix: &str) -> Fallible<Option<Timestamp>> {
        let sql = "select max(updated_at) from entries where substr(key, 1, length(?1)) = ?1;";
        let ts: Option<Timestamp> = self.conn.query_row(sql, [prefix], |row| row.get(0))?;
        Ok(ts)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Fallible<Option<String>> {
        let sql = "select value from entries where key = ?;";
        let value: Option<String> = self
            .conn
            .query_row(sql, [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Fallible<()> {
        let sql = "insert into entries (key, value, updated_at) values (?, ?, ?) on conflict (key) do update set value = excluded.value, updated_at = excluded.updated_at;";
        self.conn.execute(sql, (key, value, Timestamp::now()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Fallible<()> {
        let sql = "delete from entries where key = ?;";
        self.conn.execute(sql, [key])?;
        Ok(())
    }
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["entries"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_get_set_remove() -> Fallible<()> {
        let mut db = Database::new(":memory:")?;
        assert_eq!(db.get("quiz/a/index")?, None);
        db.set("quiz/a/index", "3")?;
        assert_eq!(db.get("quiz/a/index")?, Some("3".to_string()));
        db.set("quiz/a/index", "4")?;
        assert_eq!(db.get("quiz/a/index")?, Some("4".to_string()));
        db.remove("quiz/a/index")?;
        assert_eq!(db.get("quiz/a/index")?, None);
        db.remove("quiz/a/index")?;
        Ok(())
    }

    #[test]
    fn test_keys_with_prefix() -> Fallible<()> {
        let mut db = Database::new(":memory:")?;
        db.set("quiz/a/index", "1")?;
        db.set("quiz/a/correct", "1")?;
        db.set("quiz/ab/index", "1")?;
        db.set("quiz/b%/index", "1")?;
        assert_eq!(
            db.keys_with_prefix("quiz/a/")?,
            vec!["quiz/a/correct".to_string(), "quiz/a/index".to_string()]
        );
        assert_eq!(
            db.keys_with_prefix("quiz/b%")?,
            vec!["quiz/b%/index".to_string()]
        );
        assert_eq!(db.keys_with_prefix("quiz/")?.len(), 4);
        Ok(())
    }

    #[test]
    fn test_last_updated() -> Fallible<()> {
        let mut db = Database::new(":memory:")?;
        assert_eq!(db.last_updated("quiz/a/")?, None);
        let before = Timestamp::now();
        db.set("quiz/a/index", "1")?;
        let updated = db.last_updated("quiz/a/")?;
        assert!(updated.is_some_and(|ts| ts >= before));
        Ok(())
    }

    #[test]
    fn test_reopen_keeps_entries() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("quizrunner.db");
        let path = path.to_str().unwrap();
        {
            let mut db = Database::new(path)?;
            db.set("quiz/a/index", "2")?;
        }
        let db = Database::new(path)?;
        assert_eq!(db.get("quiz/a/index")?, Some("2".to_string()));
        Ok(())
    }
}
