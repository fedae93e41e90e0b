//! Database-backed tests. They run only when `DATABASE_URL` is set and
//! `SKIP_DB_TESTS` is not.


/// Ranked full-text search over the generated search vector
pub mod search_tests;


use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Connect and migrate once per process; `None` means the test should skip.
pub(crate) async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip: DATABASE_URL missing or SKIP_DB_TESTS set");
        return None;
    }
    MIGRATED
        .get_or_init(|| async {
            let db = crate::db::connect().await.expect("connect db for migration");
            migration::Migrator::up(&db, None).await.expect("migrate up");
        })
        .await;
    crate::db::connect().await.ok()
}
