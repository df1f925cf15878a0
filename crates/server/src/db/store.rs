use async_trait::async_trait;
use benchforge_common::{BenchmarkResult, Field, ResultSink, SinkError, TimeseriesField};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::orchestrator::{ProjectRecord, ProjectStore, ProjectStoreError};

fn decode_err(e: serde_json::Error) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}

/// Inserts a result as a new immutable row and returns it with its assigned
/// id. There is no update path; the collection is an append-only ledger.
pub async fn insert_result(
    pool: &SqlitePool,
    mut result: BenchmarkResult,
) -> Result<BenchmarkResult, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let fields_json = serde_json::to_string(&result.fields).map_err(decode_err)?;
    let timeseries_json =
        serde_json::to_string(&result.timeseries_fields).map_err(decode_err)?;

    sqlx::query(
        "INSERT INTO benchmark_results (id, project_id, runtime, timestamp_ms, fields, timeseries_fields)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&result.project_id)
    .bind(&result.runtime)
    .bind(result.timestamp_ms)
    .bind(&fields_json)
    .bind(&timeseries_json)
    .execute(pool)
    .await?;

    result.id = Some(id);
    Ok(result)
}

/// Lists stored results, optionally filtered by project, in store order.
pub async fn list_results(
    pool: &SqlitePool,
    project_id: Option<&str>,
) -> Result<Vec<BenchmarkResult>, sqlx::Error> {
    let rows = match project_id {
        Some(project_id) => {
            sqlx::query(
                "SELECT id, project_id, runtime, timestamp_ms, fields, timeseries_fields
                 FROM benchmark_results WHERE project_id = ?",
            )
            .bind(project_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT id, project_id, runtime, timestamp_ms, fields, timeseries_fields
                 FROM benchmark_results",
            )
            .fetch_all(pool)
            .await?
        }
    };

    rows.into_iter()
        .map(|row| {
            let fields: HashMap<String, Field> =
                serde_json::from_str(row.get::<String, _>("fields").as_str())
                    .map_err(decode_err)?;
            let timeseries_fields: HashMap<String, TimeseriesField> =
                serde_json::from_str(row.get::<String, _>("timeseries_fields").as_str())
                    .map_err(decode_err)?;
            Ok(BenchmarkResult {
                id: Some(row.get("id")),
                project_id: row.get("project_id"),
                runtime: row.get("runtime"),
                timestamp_ms: row.get("timestamp_ms"),
                fields,
                timeseries_fields,
            })
        })
        .collect()
}

/// Seeds a project row. Project CRUD belongs to the upload service; this
/// exists for deployments sharing one database and for tests.
pub async fn insert_project(
    pool: &SqlitePool,
    project: &ProjectRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO projects (id, project_name, runtime, archive_path) VALUES (?, ?, ?, ?)",
    )
    .bind(&project.id)
    .bind(&project.project_name)
    .bind(&project.runtime)
    .bind(&project.archive_path)
    .execute(pool)
    .await?;
    Ok(())
}

/// Direct-store transport: the second `ResultSink` mode, functionally
/// equivalent to the publisher's HTTP transport. Also used by the
/// orchestrator's fallback-result write.
#[derive(Clone)]
pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultSink for SqliteSink {
    async fn submit(&self, result: &BenchmarkResult) -> Result<(), SinkError> {
        insert_result(&self.pool, result.clone())
            .await
            .map(|_| ())
            .map_err(|e| SinkError::Store(e.to_string()))
    }
}

/// Read-only view over the projects table for the orchestrator.
#[derive(Clone)]
pub struct SqlProjectStore {
    pool: SqlitePool,
}

impl SqlProjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for SqlProjectStore {
    async fn find_project(
        &self,
        project_id: &str,
    ) -> Result<Option<ProjectRecord>, ProjectStoreError> {
        let row = sqlx::query(
            "SELECT id, project_name, runtime, archive_path FROM projects WHERE id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProjectStoreError(e.to_string()))?;

        Ok(row.map(|row| ProjectRecord {
            id: row.get("id"),
            project_name: row.get("project_name"),
            runtime: row.get("runtime"),
            archive_path: row.get("archive_path"),
        }))
    }
}
