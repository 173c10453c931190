use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

use crate::cache::Cache;
use crate::off::{self, FetchError, OffClient, OffProduct, OffResponse, ProductSummary};
use crate::product::{Barcode, InvalidBarcode};
use crate::scoring::{ScoreResult, ScoringEngine};
use crate::{EXIT_INVALID_INPUT, EXIT_NETWORK, EXIT_NOT_FOUND};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Errors that can occur while scanning a barcode
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    InvalidBarcode(#[from] InvalidBarcode),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ScanError {
    /// HTTP status a service wrapping the scanner should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            ScanError::InvalidBarcode(_) => 400,
            ScanError::Fetch(e) => e.http_status(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::InvalidBarcode(_) => EXIT_INVALID_INPUT,
            ScanError::Fetch(FetchError::NotFound { .. }) => EXIT_NOT_FOUND,
            ScanError::Fetch(_) => EXIT_NETWORK,
        }
    }
}

/// Full result of scanning one barcode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub barcode: Barcode,
    pub fetched_at: DateTime<Utc>,
    pub product: ProductSummary,
    pub score: ScoreResult,
}

/// What the scan cache holds: the raw upstream product, scored on every read
/// so a changed scoring config takes effect immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedProduct {
    pub fetched_at: DateTime<Utc>,
    pub product: OffProduct,
}

#[derive(Debug, Clone)]
pub struct Scanned {
    pub report: ScanReport,
    /// Served from the cache instead of Open Food Facts
    pub cached: bool,
}

/// Where products come from
pub trait ProductSource {
    fn fetch(&self, barcode: &Barcode) -> impl Future<Output = Result<OffProduct, FetchError>>;
}

impl ProductSource for OffClient {
    async fn fetch(&self, barcode: &Barcode) -> Result<OffProduct, FetchError> {
        self.fetch_product(barcode).await
    }
}

/// Score an Open Food Facts product
pub fn score_off_product(engine: &ScoringEngine, product: &OffProduct) -> (ProductSummary, ScoreResult) {
    let facts = off::to_facts(product);
    (off::summarize(product), engine.score(&facts))
}

/// Parse a product document saved from the API. Accepts the full envelope
/// (`{"status": 1, "product": {...}}`) or a bare product object.
pub fn parse_product_document(json: &str) -> Result<OffProduct> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("Failed to parse product document: invalid JSON")?;

    if !value.is_object() {
        anyhow::bail!("Failed to parse product document: expected a JSON object");
    }

    if value.get("product").is_some() {
        let envelope: OffResponse =
            serde_json::from_value(value).context("Failed to parse product envelope")?;
        // Saved documents may lack a status; only an explicit miss is an error
        let missing = !envelope.status.is_null()
            && envelope.status.as_i64() != Some(1)
            && envelope.status.as_str() != Some("1");
        if missing {
            anyhow::bail!("Product document reports the product as not found");
        }
        return envelope
            .product
            .context("Product document has an empty product field");
    }

    serde_json::from_value(value).context("Failed to parse product document")
}

fn cache_key(barcode: &Barcode) -> String {
    format!("product:{}", barcode)
}

type KeyLocks = Mutex<HashMap<Barcode, Arc<tokio::sync::Mutex<()>>>>;

/// Holds a barcode's slot in the in-flight map. Dropping it (including when
/// the scan future is cancelled) removes the slot once nobody else waits on it.
struct KeySlot<'a> {
    in_flight: &'a KeyLocks,
    barcode: &'a Barcode,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for KeySlot<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this slot hold it: nobody else is waiting
        if Arc::strong_count(&self.lock) <= 2 {
            in_flight.remove(self.barcode);
        }
    }
}

/// Parses barcodes, loads products from the cache or the source, and scores them.
///
/// Concurrent scans of the same barcode run one at a time, so each key is
/// fetched and populated at most once per TTL window.
pub struct Scanner<S, C> {
    source: S,
    engine: ScoringEngine,
    cache: Option<C>,
    ttl: Duration,
    in_flight: KeyLocks,
}

impl<S, C> Scanner<S, C>
where
    S: ProductSource,
    C: Cache<CachedProduct>,
{
    pub fn new(source: S, engine: ScoringEngine, cache: Option<C>, ttl: Duration) -> Self {
        Self {
            source,
            engine,
            cache,
            ttl,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn scan(&self, input: &str) -> Result<Scanned, ScanError> {
        let barcode = Barcode::parse(input)?;

        let slot = self.acquire_key(&barcode);
        let _guard = slot.lock.lock().await;
        let result = self.scan_exclusive(&barcode).await;

        result
    }

    /// Score a barcode from the cache only. `None` when it isn't cached or
    /// caching is off; never contacts the product source.
    pub fn cached(&self, input: &str) -> Result<Option<ScanReport>, InvalidBarcode> {
        let barcode = Barcode::parse(input)?;
        let entry = self.cache.as_ref().and_then(|cache| cache.get(&cache_key(&barcode)));
        Ok(entry.map(|entry| self.report(barcode, entry)))
    }

    /// Scan several barcodes concurrently.
    ///
    /// Inputs are de-duplicated by normalized barcode. Results are ordered by
    /// score descending; ties keep input order and failures come last.
    pub async fn scan_many(
        &self,
        inputs: &[String],
        concurrency: usize,
    ) -> Vec<(String, Result<Scanned, ScanError>)> {
        let mut seen = HashSet::new();
        let unique: Vec<(usize, &String)> = inputs
            .iter()
            .filter(|input| {
                let key = Barcode::parse(input)
                    .map(|b| b.to_string())
                    .unwrap_or_else(|_| input.to_string());
                seen.insert(key)
            })
            .enumerate()
            .collect();

        tracing::debug!(requested = inputs.len(), unique = unique.len(), "batch scan");

        let mut results: Vec<(usize, String, Result<Scanned, ScanError>)> = stream::iter(unique)
            .map(|(idx, input)| async move { (idx, input.clone(), self.scan(input).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        results.sort_by_key(|(idx, _, result)| match result {
            Ok(scanned) => (0, Reverse(scanned.report.score.total), *idx),
            Err(_) => (1, Reverse(0), *idx),
        });

        results
            .into_iter()
            .map(|(_, input, result)| (input, result))
            .collect()
    }

    async fn scan_exclusive(&self, barcode: &Barcode) -> Result<Scanned, ScanError> {
        let key = cache_key(barcode);

        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.get(&key) {
                tracing::debug!(%barcode, "cache hit");
                return Ok(Scanned {
                    report: self.report(barcode.clone(), entry),
                    cached: true,
                });
            }
            tracing::debug!(%barcode, "cache miss");
        }

        let entry = CachedProduct {
            fetched_at: Utc::now(),
            product: self.source.fetch(barcode).await?,
        };

        if let Some(cache) = &self.cache {
            cache.set(&key, entry.clone(), self.ttl);
        }

        Ok(Scanned {
            report: self.report(barcode.clone(), entry),
            cached: false,
        })
    }

    fn report(&self, barcode: Barcode, entry: CachedProduct) -> ScanReport {
        let (summary, score) = score_off_product(&self.engine, &entry.product);
        tracing::debug!(%barcode, total = score.total, grade = %score.grade, "scored product");

        ScanReport {
            barcode,
            fetched_at: entry.fetched_at,
            product: summary,
            score,
        }
    }

    fn acquire_key<'a>(&'a self, barcode: &'a Barcode) -> KeySlot<'a> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = in_flight.entry(barcode.clone()).or_default().clone();
        KeySlot {
            in_flight: &self.in_flight,
            barcode,
            lock,
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
