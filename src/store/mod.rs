//! KV Store Adapter (spec §4.C).
//!
//! Backing engine is SQLite via `rusqlite`, modeling a single-table KV store
//! with partition key (`pk`) + sort key (`sk`) and an inverted index used to
//! list all SiteHosts. The DynamoDB-shaped contract (range queries over
//! PK/SK, paginated results, batch writes) is preserved; only the backing
//! engine differs, so the crate runs without any external dependency.
//!
//! Failures never propagate to the orchestrator as exceptions: reads return
//! an empty/default record and writes are logged and skipped.

mod wire;

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::model::{Feed, SiteHost, SitePath};

/// Page size for paginated KV queries, mirroring DynamoDB's own per-request
/// item cap in spirit (an arbitrary but fixed bound, re-queried via
/// `LastEvaluatedKey`-style offset until exhausted).
const PAGE_SIZE: i64 = 250;

pub struct Store {
    conn: Mutex<Connection>,
}

#[derive(Clone, Debug)]
pub struct SiteSummary {
    pub host: String,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Store {
    pub fn open(db_path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_items (
                pk TEXT NOT NULL,
                sk TEXT NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (pk, sk)
            );
            CREATE INDEX IF NOT EXISTS idx_kv_items_sk ON kv_items (sk);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_items (
                pk TEXT NOT NULL,
                sk TEXT NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (pk, sk)
            );
            CREATE INDEX IF NOT EXISTS idx_kv_items_sk ON kv_items (sk);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn paginate(
        conn: &Connection,
        pk_eq: Option<&str>,
        sk_between: Option<(&str, &str)>,
        sk_eq: Option<&str>,
    ) -> Vec<(String, String, String)> {
        let mut rows = Vec::new();
        let mut offset: i64 = 0;
        loop {
            let mut sql = String::from("SELECT pk, sk, payload FROM kv_items WHERE 1=1");
            if pk_eq.is_some() {
                sql.push_str(" AND pk = ?1");
            }
            if sk_between.is_some() {
                sql.push_str(" AND sk BETWEEN ?2 AND ?3");
            }
            if sk_eq.is_some() {
                sql.push_str(" AND sk = ?4");
            }
            sql.push_str(" ORDER BY pk, sk LIMIT ?5 OFFSET ?6");

            let pk_param = pk_eq.unwrap_or_default();
            let (lo, hi) = sk_between.unwrap_or(("", ""));
            let sk_param = sk_eq.unwrap_or_default();

            let mut stmt = match conn.prepare(&sql) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("store query prepare failed: {e}");
                    return rows;
                }
            };
            let page: Result<Vec<(String, String, String)>, rusqlite::Error> = stmt
                .query_map(
                    rusqlite::params![pk_param, lo, hi, sk_param, PAGE_SIZE, offset],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
                )
                .and_then(|mapped| mapped.collect());

            match page {
                Ok(page) => {
                    let got = page.len() as i64;
                    rows.extend(page);
                    if got < PAGE_SIZE {
                        break;
                    }
                    offset += PAGE_SIZE;
                }
                Err(e) => {
                    tracing::error!("store query failed: {e}");
                    break;
                }
            }
        }
        rows
    }

    /// One range query over `PK = SITE#<host>` and `SK BETWEEN #METADATA#
    /// AND FEED$`, loading `items[0]` as the SiteHost and `items[1:]` as
    /// Feeds.
    pub fn query_site_feeds(&self, host: &str) -> SiteHost {
        let pk = wire::site_pk(host);
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(_) => return SiteHost::new(host),
        };
        let rows = Self::paginate(
            &conn,
            Some(&pk),
            Some((wire::SITE_SK_METADATA, "FEED$")),
            None,
        );
        if rows.is_empty() {
            return SiteHost::new(host);
        }

        let mut site = match wire::decode_site(&rows[0].2) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("site decode failed: {e}");
                SiteHost::new(host)
            }
        };

        let mut feeds = Vec::new();
        for (_, _, payload) in &rows[1..] {
            match wire::decode_feed(payload) {
                Ok(f) => feeds.push(f),
                Err(e) => tracing::warn!("feed decode failed: {e}"),
            }
        }
        site.load_feeds(feeds);
        site
    }

    /// Point query for a single SitePath record.
    pub fn query_site_path(&self, host: &str, path: &str) -> SitePath {
        let pk = wire::sitepath_pk(host);
        let sk = wire::sitepath_sk(path);
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(_) => return SitePath::new(host, path),
        };
        let rows = Self::paginate(&conn, Some(&pk), None, Some(&sk));
        match rows.first() {
            Some((_, _, payload)) => wire::decode_sitepath(payload).unwrap_or_else(|e| {
                tracing::warn!("sitepath decode failed: {e}");
                SitePath::new(host, path)
            }),
            None => SitePath::new(host, path),
        }
    }

    /// Paginated inverted-index query listing all SiteHosts (query by
    /// `SK = "#METADATA#"`).
    pub fn list_sites(&self) -> Vec<SiteSummary> {
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };
        let rows = Self::paginate(&conn, None, None, Some(wire::SITE_SK_METADATA));
        rows.iter()
            .filter_map(|(_, _, payload)| match wire::decode_site(payload) {
                Ok(site) => Some(SiteSummary {
                    host: site.host,
                    last_seen: site.last_seen,
                }),
                Err(e) => {
                    tracing::error!("list_sites decode failed: {e}");
                    None
                }
            })
            .collect()
    }

    /// Batch write: one SiteHost item, the SitePath item, and one item per
    /// Feed. Any failure is logged and the whole write is skipped (never
    /// reaches the caller as an error).
    pub fn save(&self, site: &SiteHost, feeds: &[Feed], site_path: &SitePath) {
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(_) => {
                tracing::error!("store mutex poisoned, skipping save");
                return;
            }
        };

        let (site_pk, site_sk, site_payload) = wire::encode_site(site);
        let (path_pk, path_sk, path_payload) = wire::encode_sitepath(site_path);

        let result: rusqlite::Result<()> = (|| {
            conn.execute(
                "INSERT INTO kv_items (pk, sk, payload) VALUES (?1, ?2, ?3)
                 ON CONFLICT(pk, sk) DO UPDATE SET payload = excluded.payload",
                rusqlite::params![site_pk, site_sk, site_payload],
            )?;
            conn.execute(
                "INSERT INTO kv_items (pk, sk, payload) VALUES (?1, ?2, ?3)
                 ON CONFLICT(pk, sk) DO UPDATE SET payload = excluded.payload",
                rusqlite::params![path_pk, path_sk, path_payload],
            )?;
            for feed in feeds {
                let (fpk, fsk, fpayload) = wire::encode_feed(feed);
                conn.execute(
                    "INSERT INTO kv_items (pk, sk, payload) VALUES (?1, ?2, ?3)
                     ON CONFLICT(pk, sk) DO UPDATE SET payload = excluded.payload",
                    rusqlite::params![fpk, fsk, fpayload],
                )?;
            }
            Ok(())
        })();

        if let Err(e) = result {
            tracing::warn!("store save failed: {e}");
        }
    }

    /// Async wrappers running the synchronous `rusqlite` calls above on a
    /// blocking-pool thread, so they never hold up the Tokio reactor the
    /// orchestrator's other suspension points (directory call, crawl) share
    /// (spec §5: "store reads/writes" are suspension points, not CPU work).
    /// `self` must be an `Arc<Store>` so the blocking closure can own a
    /// handle independent of the calling future's lifetime.
    pub async fn query_site_feeds_async(self: std::sync::Arc<Self>, host: String) -> SiteHost {
        let host_for_err = host.clone();
        tokio::task::spawn_blocking(move || self.query_site_feeds(&host))
            .await
            .unwrap_or_else(|_| SiteHost::new(host_for_err))
    }

    pub async fn query_site_path_async(self: std::sync::Arc<Self>, host: String, path: String) -> SitePath {
        let (host_for_err, path_for_err) = (host.clone(), path.clone());
        tokio::task::spawn_blocking(move || self.query_site_path(&host, &path))
            .await
            .unwrap_or_else(|_| SitePath::new(host_for_err, path_for_err))
    }

    pub async fn list_sites_async(self: std::sync::Arc<Self>) -> Vec<SiteSummary> {
        tokio::task::spawn_blocking(move || self.list_sites())
            .await
            .unwrap_or_default()
    }

    pub async fn save_async(self: std::sync::Arc<Self>, site: SiteHost, feeds: Vec<Feed>, site_path: SitePath) {
        let joined = tokio::task::spawn_blocking(move || self.save(&site, &feeds, &site_path)).await;
        if joined.is_err() {
            tracing::error!("store save task panicked");
        }
    }
}
