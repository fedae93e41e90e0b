#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn db_configured() -> bool {
    let _ = dotenvy::dotenv();
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}

/// Connection to a migrated test database, or `None` when tests should skip the DB.
pub async fn get_db() -> Option<DatabaseConnection> {
    if !db_configured() {
        eprintln!("skipping DB test: DATABASE_URL not set or SKIP_DB_TESTS set");
        return None;
    }
    let migrated = *MIGRATED
        .get_or_init(|| async {
            let Ok(db) = models::db::connect().await else { return false };
            migration::Migrator::up(&db, None).await.is_ok()
        })
        .await;
    if !migrated {
        eprintln!("skipping DB test: migration failed");
        return None;
    }
    models::db::connect().await.ok()
}
