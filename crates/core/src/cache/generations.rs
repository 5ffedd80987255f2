//! Cache generation bookkeeping.
//!
//! A generation is a named bucket of entries. Install creates the current one
//! and marks it ready once the precache manifest is stored; activate deletes
//! every other one.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Summary of a cache generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Generation {
    pub name: String,
    pub created_at: String,
    pub ready: bool,
    pub entries: u64,
}

impl CacheDb {
    /// Create a generation if it doesn't exist.
    ///
    /// Returns true if the generation was created by this call.
    pub async fn open_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let created = conn.execute(
                    "INSERT OR IGNORE INTO cache_generations (name, created_at, ready) VALUES (?1, ?2, 0)",
                    params![name, now],
                )?;
                Ok(created == 1)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every generation, oldest first.
    pub async fn generation_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_generations ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Every generation with its entry count, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<Generation>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Generation>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT g.name, g.created_at, g.ready, COUNT(e.key)
                     FROM cache_generations g
                     LEFT JOIN cache_entries e ON e.generation = g.name
                     GROUP BY g.name
                     ORDER BY g.created_at, g.name",
                )?;
                let generations = stmt
                    .query_map([], |row| {
                        Ok(Generation {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            ready: row.get::<_, i32>(2)? == 1,
                            entries: row.get::<_, i64>(3)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(generations)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a generation exists.
    pub async fn has_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and, by cascade, all of its entries.
    ///
    /// Returns false if the generation did not exist.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_generations WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Mark a generation as fully populated.
    pub async fn mark_generation_ready(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let updated = conn.execute("UPDATE cache_generations SET ready = 1 WHERE name = ?1", params![name])?;
                if updated == 0 {
                    return Err(Error::CacheMiss(format!("generation {name}")));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a generation exists and has been marked ready.
    pub async fn is_generation_ready(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let ready: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_generations WHERE name = ?1 AND ready = 1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(ready)
            })
            .await
            .map_err(Error::from)
    }
}
