use anyhow::Result;
use price_recon::util::env as env_util;

/// Startup configuration preflight: verifies the store DSN and marketplace
/// endpoint are present and prints a redacted snapshot. Exits non-zero on
/// missing required keys, matching the pipeline's fatal-at-startup contract.
fn main() -> Result<()> {
    price_recon::tracing::init_tracing("info")?;

    env_util::preflight_check(
        "validate_env",
        &["MARKETPLACE_API_URL"],
        &[
            "MARKETPLACE_API_URL",
            "EMBEDDINGS_API_URL",
            "EMBEDDINGS_MODEL",
            "EMBEDDINGS_API_KEY",
            "DATABASE_URL",
            "SUPABASE_DB_URL",
            "SUPABASE_DB_SESSION_URL",
            "DB_MAX_CONNECTIONS",
            "REQUEST_TIMEOUT_SECS",
        ],
    )?;
    env_util::db_url()?;
    println!("environment OK");
    Ok(())
}
