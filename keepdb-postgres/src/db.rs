use keepdb_config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Connects to the database named in `config` with a small pool.
pub async fn connect_to_database(
    config: &PgConnectionConfig,
    min_connections: u32,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let options = config.with_db();

    let pool = PgPoolOptions::new()
        .min_connections(min_connections)
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}
