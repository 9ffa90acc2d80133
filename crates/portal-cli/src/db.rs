//! Database maintenance command handlers for the CLI.

pub(crate) async fn run_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let latency = portal_db::health_check(pool).await?;
    println!("database: ok ({} ms)", latency.as_millis());
    Ok(())
}

pub(crate) async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = portal_db::run_migrations(pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Wipe the catalog and load the sample products, all prices pending.
///
/// # Errors
///
/// Returns an error if the seed transaction fails; the previous catalog is
/// then left as it was.
pub(crate) async fn run_seed(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let count = portal_db::seed_products(pool, portal_db::sample_catalog()).await?;
    tracing::info!(count, "catalog seeded");
    println!("seeded {count} product(s)");
    Ok(())
}
