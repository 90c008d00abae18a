use anyhow::Result;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::error::Error;

/// Migration files compiled into the binary, in any order
const MIGRATIONS: &[(&str, &str)] = &[
    ("add_indexes.sql", include_str!("sql/add_indexes.sql")),
    ("add_foreign_keys.sql", include_str!("sql/add_foreign_keys.sql")),
    ("002_create_incidents.sql", include_str!("sql/002_create_incidents.sql")),
    ("001_create_cameras.sql", include_str!("sql/001_create_cameras.sql")),
];

/// Apply every migration. Each script is idempotent, so this runs on every start.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    for (name, sql) in ordered_migrations() {
        execute_migration(pool, name, sql).await?;
        info!("Applied migration: {}", name);
    }

    Ok(())
}

/// Tables first by numeric prefix, then foreign keys, then indexes
fn ordered_migrations() -> Vec<(&'static str, &'static str)> {
    let mut entries = MIGRATIONS.to_vec();
    entries.sort_by_key(|(name, _)| (order_value(name), *name));
    entries
}

fn order_value(name: &str) -> usize {
    if name.starts_with("add_foreign_keys") {
        1000
    } else if name.starts_with("add_indexes") {
        2000
    } else {
        name.split('_')
            .next()
            .and_then(|prefix| prefix.parse::<usize>().ok())
            .unwrap_or(usize::MAX)
    }
}

async fn execute_migration(pool: &PgPool, name: &str, sql: &str) -> Result<()> {
    pool.execute(sql)
        .await
        .map_err(|e| Error::Database(format!("Migration {} failed: {}", name, e)))?;
    Ok(())
}
