use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use once_cell::sync::Lazy;
use reqwest::Url;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CACHE_VERSION: u32 = 2;
const CACHE_DIR: &str = "hornets_stats";
const CACHE_FILE: &str = "responses.json";

static RESPONSES: Lazy<Mutex<ResponseCache>> =
    Lazy::new(|| Mutex::new(ResponseCache::open(app_cache_dir().map(|d| d.join(CACHE_FILE)))));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredResponse {
    body: String,
    /// Unix seconds.
    fetched_at: i64,
}

impl StoredResponse {
    fn age_secs(&self, now: i64) -> i64 {
        now.saturating_sub(self.fetched_at)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    version: u32,
    responses: BTreeMap<String, StoredResponse>,
}

/// What the cache holds for a URL at a given moment.
#[derive(Debug, Clone, PartialEq)]
enum Lookup {
    Fresh(String),
    Stale(String),
    Missing,
}

/// Body to hand back after a network attempt.
#[derive(Debug, PartialEq)]
enum Served {
    Fetched(String),
    StaleFallback { body: String, error: String },
}

/// Network result wins; on failure a stale body is better than nothing.
fn settle(fetched: Result<String>, stale: Option<String>) -> Result<Served> {
    match (fetched, stale) {
        (Ok(body), _) => Ok(Served::Fetched(body)),
        (Err(err), Some(body)) => Ok(Served::StaleFallback {
            body,
            error: format!("{err:#}"),
        }),
        (Err(err), None) => Err(err),
    }
}

/// URL-keyed response bodies persisted as one JSON document.
#[derive(Debug, Default)]
struct ResponseCache {
    path: Option<PathBuf>,
    responses: BTreeMap<String, StoredResponse>,
}

impl ResponseCache {
    /// Unreadable, corrupt or old-version documents start an empty cache.
    fn open(path: Option<PathBuf>) -> Self {
        let responses = path
            .as_deref()
            .and_then(|p| fs::read(p).ok())
            .and_then(|raw| serde_json::from_slice::<CacheDocument>(&raw).ok())
            .filter(|doc| doc.version == CACHE_VERSION)
            .map(|doc| doc.responses)
            .unwrap_or_default();
        Self { path, responses }
    }

    fn lookup(&self, key: &str, now: i64, max_age: Duration) -> Lookup {
        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        match self.responses.get(key) {
            Some(r) if r.age_secs(now) < max_age => Lookup::Fresh(r.body.clone()),
            Some(r) => Lookup::Stale(r.body.clone()),
            None => Lookup::Missing,
        }
    }

    fn store(&mut self, key: &str, body: &str, now: i64) -> Result<()> {
        self.responses.insert(
            key.to_string(),
            StoredResponse {
                body: body.to_string(),
                fetched_at: now,
            },
        );
        match self.path.as_deref() {
            Some(path) => self.persist(path),
            None => Ok(()),
        }
    }

    /// Whole-document rewrite through a sibling temp file and a rename.
    fn persist(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create cache dir {}", dir.display()))?;
        }
        let doc = CacheDocument {
            version: CACHE_VERSION,
            responses: self.responses.clone(),
        };
        let bytes = serde_json::to_vec(&doc).context("encode response cache")?;
        let tmp = path.with_extension("json.part");
        fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }
}

/// GET `base` with `query`, serving the body from the on-disk cache while it
/// is younger than `max_age`. A failed request falls back to a stale body
/// when one exists.
pub fn fetch_json_cached(
    client: &Client,
    base: &str,
    query: &[(&str, &str)],
    max_age: Duration,
) -> Result<String> {
    let url = Url::parse_with_params(base, query).with_context(|| format!("bad url {base}"))?;
    let key = url.to_string();
    let now = Utc::now().timestamp();

    let lookup = RESPONSES
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .lookup(&key, now, max_age);
    let stale = match lookup {
        Lookup::Fresh(body) => {
            debug!(url = %key, "serving cached response");
            return Ok(body);
        }
        Lookup::Stale(body) => Some(body),
        Lookup::Missing => None,
    };

    match settle(fetch_body(client, url), stale)? {
        Served::Fetched(body) => {
            let mut cache = RESPONSES.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(err) = cache.store(&key, &body, now) {
                warn!(error = %err, "could not persist response cache");
            }
            Ok(body)
        }
        Served::StaleFallback { body, error } => {
            warn!(url = %key, %error, "request failed, serving stale cached response");
            Ok(body)
        }
    }
}

fn fetch_body(client: &Client, url: Url) -> Result<String> {
    let resp = client.get(url).send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {}: {}", status, body));
    }
    Ok(body)
}

/// `$XDG_CACHE_HOME/hornets_stats`, else `$HOME/.cache/hornets_stats`.
pub fn app_cache_dir() -> Option<PathBuf> {
    let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
    non_empty("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| non_empty("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .map(|base| base.join(CACHE_DIR))
}
