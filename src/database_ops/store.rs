//! Read/write contract between the matching core and the persistent store.
//!
//! The pipeline only ever talks to `dyn ReconStore`; `PgStore` is the
//! production implementation, and tests use the in-memory `MemStore` so the
//! idempotence guarantees can be asserted without a database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::marketplace::types::Product;

use super::db::Db;

/// One reconciled competitor price, unique per (product_slug, competitor_name).
/// Upserting the same pair replaces the price, never adds a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorPriceRecord {
    pub product_slug: String,
    pub competitor_name: String,
    pub competitor_price: i64,
}

/// Low-confidence match routed to the human review queue. Insert-only from
/// this crate; the review UI flips `status` later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: Uuid,
    pub product_slug: String,
    pub candidate_name: String,
    pub candidate_shop: String,
    pub fuzzy_score: f64,
    pub semantic_score: Option<f64>,
    pub raw_payload: Value,
    pub status: String,
    pub queued_at: DateTime<Utc>,
}

#[async_trait]
pub trait ReconStore: Send + Sync {
    /// Insert-or-update a product keyed on its URL. Re-ingesting the same
    /// URL updates name/price in place.
    async fn upsert_product(&self, product: &Product) -> Result<()>;

    async fn list_products(&self, limit: Option<i64>) -> Result<Vec<Product>>;

    /// Insert-or-update keyed on (product_slug, competitor_name).
    async fn upsert_competitor_price(&self, record: &CompetitorPriceRecord) -> Result<()>;

    async fn competitor_prices_for(&self, product_slug: &str)
        -> Result<Vec<CompetitorPriceRecord>>;

    async fn enqueue_review(&self, item: &ReviewItem) -> Result<()>;
}

#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReconStore for PgStore {
    async fn upsert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (url, name, price, updated_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (url) DO UPDATE \
               SET name = EXCLUDED.name, price = EXCLUDED.price, updated_at = now()",
        )
        .bind(&product.url)
        .bind(&product.name)
        .bind(product.price)
        .execute(&self.db.pool)
        .await?;
        Ok(())
    }

    async fn list_products(&self, limit: Option<i64>) -> Result<Vec<Product>> {
        let rows: Vec<(String, String, i64)> = match limit {
            Some(n) => {
                sqlx::query_as("SELECT url, name, price FROM products ORDER BY url LIMIT $1")
                    .bind(n)
                    .fetch_all(&self.db.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT url, name, price FROM products ORDER BY url")
                    .fetch_all(&self.db.pool)
                    .await?
            }
        };
        Ok(rows
            .into_iter()
            .map(|(url, name, price)| Product { url, name, price })
            .collect())
    }

    async fn upsert_competitor_price(&self, record: &CompetitorPriceRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO competitor_prices (product_slug, competitor_name, competitor_price, updated_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (product_slug, competitor_name) DO UPDATE \
               SET competitor_price = EXCLUDED.competitor_price, updated_at = now()",
        )
        .bind(&record.product_slug)
        .bind(&record.competitor_name)
        .bind(record.competitor_price)
        .execute(&self.db.pool)
        .await?;
        Ok(())
    }

    async fn competitor_prices_for(
        &self,
        product_slug: &str,
    ) -> Result<Vec<CompetitorPriceRecord>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT product_slug, competitor_name, competitor_price \
             FROM competitor_prices WHERE product_slug = $1 ORDER BY competitor_name",
        )
        .bind(product_slug)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(
                |(product_slug, competitor_name, competitor_price)| CompetitorPriceRecord {
                    product_slug,
                    competitor_name,
                    competitor_price,
                },
            )
            .collect())
    }

    async fn enqueue_review(&self, item: &ReviewItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO review_queue \
               (id, product_slug, candidate_name, candidate_shop, fuzzy_score, \
                semantic_score, raw_payload, status, queued_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(item.id)
        .bind(&item.product_slug)
        .bind(&item.candidate_name)
        .bind(&item.candidate_shop)
        .bind(item.fuzzy_score)
        .bind(item.semantic_score)
        .bind(&item.raw_payload)
        .bind(&item.status)
        .bind(item.queued_at)
        .execute(&self.db.pool)
        .await?;
        Ok(())
    }
}

/// In-memory store used by the test suites. Mirrors the conflict-key
/// behavior of `PgStore` exactly: products keyed on url, competitor prices
/// keyed on (slug, seller), review queue append-only.
#[cfg(test)]
#[derive(Default)]
pub struct MemStore {
    inner: std::sync::Mutex<MemStoreInner>,
}

#[cfg(test)]
#[derive(Default)]
struct MemStoreInner {
    products: Vec<Product>,
    prices: Vec<CompetitorPriceRecord>,
    reviews: Vec<ReviewItem>,
}

#[cfg(test)]
impl MemStore {
    pub fn prices(&self) -> Vec<CompetitorPriceRecord> {
        self.inner.lock().unwrap().prices.clone()
    }

    pub fn reviews(&self) -> Vec<ReviewItem> {
        self.inner.lock().unwrap().reviews.clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ReconStore for MemStore {
    async fn upsert_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.products.iter_mut().find(|p| p.url == product.url) {
            Some(existing) => {
                existing.name = product.name.clone();
                existing.price = product.price;
            }
            None => inner.products.push(product.clone()),
        }
        Ok(())
    }

    async fn list_products(&self, limit: Option<i64>) -> Result<Vec<Product>> {
        let inner = self.inner.lock().unwrap();
        let mut out = inner.products.clone();
        if let Some(n) = limit {
            out.truncate(n.max(0) as usize);
        }
        Ok(out)
    }

    async fn upsert_competitor_price(&self, record: &CompetitorPriceRecord) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.prices.iter_mut().find(|r| {
            r.product_slug == record.product_slug && r.competitor_name == record.competitor_name
        }) {
            Some(existing) => existing.competitor_price = record.competitor_price,
            None => inner.prices.push(record.clone()),
        }
        Ok(())
    }

    async fn competitor_prices_for(
        &self,
        product_slug: &str,
    ) -> Result<Vec<CompetitorPriceRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .prices
            .iter()
            .filter(|r| r.product_slug == product_slug)
            .cloned()
            .collect())
    }

    async fn enqueue_review(&self, item: &ReviewItem) -> Result<()> {
        self.inner.lock().unwrap().reviews.push(item.clone());
        Ok(())
    }
}
