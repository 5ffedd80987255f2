//! Cache entry operations.
//!
//! Entries are keyed by `(generation, hash of normalized URL)` and written
//! with upsert semantics, so concurrent writers for one URL resolve to the
//! last write.

use std::collections::BTreeMap;

use super::connection::CacheDb;
use super::hash::{compute_entry_key, normalize_url};
use crate::Error;
use crate::http::Response;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// A stored request/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    pub generation: String,
    pub key: String,
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub response_url: Option<String>,
    pub stored_at: String,
}

impl CachedEntry {
    /// Rebuild the response as it was stored.
    pub fn into_response(self) -> Response {
        let url = self.response_url.as_deref().and_then(|u| Url::parse(u).ok());
        Response { status: self.status, headers: self.headers, body: self.body.into(), url }
    }
}

/// Row shape shared by every entry insert.
struct EntryRow {
    key: String,
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
    response_url: Option<String>,
}

impl EntryRow {
    fn new(url: &Url, response: &Response) -> Result<Self, Error> {
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        Ok(Self {
            key: compute_entry_key(url),
            url: normalize_url(url).to_string(),
            status: i64::from(response.status),
            headers_json,
            body: response.body.to_vec(),
            response_url: response.url.as_ref().map(Url::to_string),
        })
    }
}

const UPSERT_ENTRY: &str = "INSERT INTO cache_entries (
        generation, key, url, status, headers_json, body, response_url, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(generation, key) DO UPDATE SET
        url = excluded.url,
        status = excluded.status,
        headers_json = excluded.headers_json,
        body = excluded.body,
        response_url = excluded.response_url,
        stored_at = excluded.stored_at";

const ENSURE_GENERATION: &str =
    "INSERT OR IGNORE INTO cache_generations (name, created_at, ready) VALUES (?1, ?2, 0)";

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CachedEntry, String)> {
    let headers_json: String = row.get(4)?;
    Ok((
        CachedEntry {
            generation: row.get(0)?,
            key: row.get(1)?,
            url: row.get(2)?,
            status: row.get::<_, i64>(3)? as u16,
            headers: BTreeMap::new(),
            body: row.get(5)?,
            response_url: row.get(6)?,
            stored_at: row.get(7)?,
        },
        headers_json,
    ))
}

fn decode_headers((mut entry, headers_json): (CachedEntry, String)) -> Result<CachedEntry, Error> {
    entry.headers = serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    Ok(entry)
}

impl CacheDb {
    /// Store a response for `url` in `generation`, replacing any prior entry.
    ///
    /// The generation is created if it doesn't exist yet.
    pub async fn put_entry(&self, generation: &str, url: &Url, response: &Response) -> Result<(), Error> {
        let generation = generation.to_string();
        let row = EntryRow::new(url, response)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(ENSURE_GENERATION, params![&generation, &now])?;
                conn.execute(
                    UPSERT_ENTRY,
                    params![
                        &generation,
                        &row.key,
                        &row.url,
                        row.status,
                        &row.headers_json,
                        &row.body,
                        &row.response_url,
                        &now
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store several responses in one transaction: all are written or none are.
    pub async fn put_entries(&self, generation: &str, entries: &[(Url, Response)]) -> Result<(), Error> {
        let generation = generation.to_string();
        let rows = entries
            .iter()
            .map(|(url, response)| EntryRow::new(url, response))
            .collect::<Result<Vec<_>, Error>>()?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(ENSURE_GENERATION, params![&generation, &now])?;
                for row in &rows {
                    tx.execute(
                        UPSERT_ENTRY,
                        params![
                            &generation,
                            &row.key,
                            &row.url,
                            row.status,
                            &row.headers_json,
                            &row.body,
                            &row.response_url,
                            &now
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for `url` in one generation.
    pub async fn get_entry(&self, generation: &str, url: &Url) -> Result<Option<CachedEntry>, Error> {
        let generation = generation.to_string();
        let key = compute_entry_key(url);
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let result = conn.query_row(
                    "SELECT generation, key, url, status, headers_json, body, response_url, stored_at
                     FROM cache_entries WHERE generation = ?1 AND key = ?2",
                    params![generation, key],
                    read_entry,
                );

                match result {
                    Ok(raw) => decode_headers(raw).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for `url` in any generation, oldest generation first.
    pub async fn find_entry(&self, url: &Url) -> Result<Option<CachedEntry>, Error> {
        let key = compute_entry_key(url);
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let result = conn.query_row(
                    "SELECT e.generation, e.key, e.url, e.status, e.headers_json, e.body, e.response_url, e.stored_at
                     FROM cache_entries e
                     JOIN cache_generations g ON g.name = e.generation
                     WHERE e.key = ?1
                     ORDER BY g.created_at, g.name
                     LIMIT 1",
                    params![key],
                    read_entry,
                );

                match result {
                    Ok(raw) => decode_headers(raw).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in a generation.
    pub async fn count_entries(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE generation = ?1",
                    params![generation],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
