use std::collections::HashSet;
use std::path::Path;

use keepdb_config::shared::PgConnectionConfig;
use sqlx::migrate::{Migrate, MigrateError, Migration, Migrator};
use tracing::info;

use crate::db::connect_to_database;

/// Applies the sqlx migrations found in `directory` to the database named in `config`.
///
/// Migrations already recorded in the database are skipped by sqlx, so a reused test
/// database only gets what is new. Returns the number of migrations applied by this call.
pub async fn run_migrations(
    config: &PgConnectionConfig,
    directory: &Path,
) -> Result<usize, MigrateError> {
    let migrator = Migrator::new(directory).await?;
    let pool = connect_to_database(config, 1, 1).await?;

    let result = apply(&migrator, &pool).await;
    pool.close().await;
    let count = result?;

    info!(database = %config.name, count, "migrations applied");

    Ok(count)
}

async fn apply(migrator: &Migrator, pool: &sqlx::PgPool) -> Result<usize, MigrateError> {
    let applied = {
        let mut connection = pool.acquire().await?;
        connection.ensure_migrations_table().await?;
        connection
            .list_applied_migrations()
            .await?
            .into_iter()
            .map(|migration| migration.version)
            .collect::<HashSet<_>>()
    };

    let pending = pending_migrations(migrator.iter(), &applied);
    migrator.run(pool).await?;

    Ok(pending)
}

/// Counts the up migrations whose version is not in `applied`.
fn pending_migrations<'a>(
    migrations: impl IntoIterator<Item = &'a Migration>,
    applied: &HashSet<i64>,
) -> usize {
    migrations
        .into_iter()
        .filter(|migration| !migration.migration_type.is_down_migration())
        .filter(|migration| !applied.contains(&migration.version))
        .count()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn migrations_dir(files: &[&str]) -> PathBuf {
        let directory =
            std::env::temp_dir().join(format!("keepdb-migrations-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&directory).unwrap();
        for file in files {
            fs::write(directory.join(file), "select 1;").unwrap();
        }

        directory
    }

    #[tokio::test]
    async fn reversible_migration_counts_once() {
        let directory = migrations_dir(&["1_init.up.sql", "1_init.down.sql"]);
        let migrator = Migrator::new(directory.as_path()).await.unwrap();

        assert_eq!(pending_migrations(migrator.iter(), &HashSet::new()), 1);

        fs::remove_dir_all(directory).unwrap();
    }

    #[tokio::test]
    async fn applied_migrations_are_not_counted() {
        let directory = migrations_dir(&["1_init.sql", "2_users.sql", "3_orders.sql"]);
        let migrator = Migrator::new(directory.as_path()).await.unwrap();

        let applied = HashSet::from([1, 2]);
        assert_eq!(pending_migrations(migrator.iter(), &applied), 1);

        let applied = HashSet::from([1, 2, 3]);
        assert_eq!(pending_migrations(migrator.iter(), &applied), 0);

        fs::remove_dir_all(directory).unwrap();
    }
}
