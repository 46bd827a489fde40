use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use price_recon::database_ops::db::Db;
use price_recon::database_ops::store::{PgStore, ReconStore};
use price_recon::marketplace::client::HttpMarketplace;
use price_recon::matching::embedding::{EmbeddingProvider, HttpEmbeddings};
use price_recon::reconcile::reconcile_product;
use price_recon::util::env as env_util;

/// Reconcile competitor prices for every stored catalog product.
#[derive(Parser, Debug)]
#[command(name = "recon")]
struct Args {
    /// Only process the first N products.
    #[arg(long)]
    limit: Option<i64>,

    /// Only process products whose slug contains this substring.
    #[arg(long)]
    slug: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    price_recon::tracing::init_tracing("info,sqlx=warn")?;
    let args = Args::parse();

    // Missing store or marketplace configuration is the one fatal error
    // class; everything downstream degrades per record instead.
    env_util::preflight_check(
        "recon",
        &["MARKETPLACE_API_URL"],
        &[
            "MARKETPLACE_API_URL",
            "EMBEDDINGS_API_URL",
            "EMBEDDINGS_MODEL",
            "DATABASE_URL",
            "SUPABASE_DB_URL",
        ],
    )?;
    let database_url = env_util::db_url().context("no database URL env vars set")?;

    let db = Db::connect(&database_url, env_util::env_parse("DB_MAX_CONNECTIONS", 5)).await?;
    let store = PgStore::new(db);
    let marketplace = HttpMarketplace::from_env()?;
    let embeddings = HttpEmbeddings::from_env()?;
    match &embeddings {
        Some(_) => info!("semantic scoring enabled"),
        None => info!("EMBEDDINGS_API_URL not set; running lexical-only"),
    }
    let embeddings_ref: Option<&dyn EmbeddingProvider> =
        embeddings.as_ref().map(|e| e as &dyn EmbeddingProvider);

    let mut products = store.list_products(args.limit).await?;
    if let Some(fragment) = &args.slug {
        products.retain(|p| p.slug().contains(fragment.as_str()));
    }
    info!(count = products.len(), "starting reconciliation run");

    let mut written = 0usize;
    let mut reviewed = 0usize;
    for product in &products {
        match reconcile_product(product, &marketplace, &marketplace, embeddings_ref, &store).await
        {
            Ok(outcome) => {
                written += outcome.written;
                reviewed += usize::from(outcome.reviewed);
            }
            Err(e) => warn!(slug = %product.slug(), error = %e, "product reconciliation failed"),
        }
    }

    info!(
        products = products.len(),
        prices_written = written,
        reviews_queued = reviewed,
        "reconciliation run complete"
    );
    Ok(())
}
