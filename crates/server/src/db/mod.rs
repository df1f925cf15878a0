use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub mod store;

const BENCHMARK_RESULTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS benchmark_results (
    id                TEXT PRIMARY KEY,
    project_id        TEXT NOT NULL,
    runtime           TEXT NOT NULL,
    timestamp_ms      INTEGER NOT NULL,
    fields            TEXT NOT NULL,
    timeseries_fields TEXT NOT NULL
)
"#;

const PROJECTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id           TEXT PRIMARY KEY,
    project_name TEXT NOT NULL,
    runtime      TEXT NOT NULL,
    archive_path TEXT NOT NULL
)
"#;

/// Connects the pool and ensures the schema exists. The benchmark store is an
/// append-only document table; the projects table is owned by the upload
/// service and only read here.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::query(BENCHMARK_RESULTS_SCHEMA).execute(&pool).await?;
    sqlx::query(PROJECTS_SCHEMA).execute(&pool).await?;

    Ok(pool)
}
