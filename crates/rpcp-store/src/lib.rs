//! C2 Store: the single authority for durable state (§5 "Shared-resource
//! policy"). A `sqlx::PgPool` wrapper, embedded migrations, and typed
//! repository functions per entity: connect-from-env, `sqlx::migrate!`,
//! and manual row mapping (`Row::try_get`) rather than compile-time
//! checked `query!` macros, so this crate never needs a live database at
//! build time.

pub mod repo;

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

pub const ENV_DB_URL: &str = "RPCP_DATABASE_URL";

pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

pub async fn connect(url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await.context("store migrate failed")
}

/// Runs `f` inside a transaction, committing on `Ok` and rolling back on
/// `Err`. §5 "Configuration rows ... writes are serialized through `txn`."
/// Snapshot isolation (read committed is Postgres's default and is what's
/// actually used here; full snapshot/serializable is a tuning knob left to
/// the pool's connection options, not this helper).
pub async fn txn<'p, F, T>(pool: &'p PgPool, f: F) -> Result<T>
where
    F: for<'c> FnOnce(&'c mut Transaction<'static, Postgres>) -> BoxFuture<'c, Result<T>>,
{
    let mut tx = pool.begin().await.context("begin transaction")?;
    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await.context("commit transaction")?;
            Ok(value)
        }
        Err(err) => {
            tx.rollback().await.context("rollback transaction")?;
            Err(err)
        }
    }
}
