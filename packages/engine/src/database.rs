use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Connect and bring the schema up to date.
///
/// Every entity under `engine::entity` is registered at compile time; the
/// schema registry syncs the tables on startup, so there is no hand-written
/// DDL. Composite indexes are the one thing sync cannot express; see
/// `seed::ensure_indexes`, which callers run right after this.
pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(30 * 60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("engine::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}
