//! Sales spreadsheet ingestion
//!
//! An upload is staged to a temp file, recorded as `processing`, handed to the
//! offline pipeline and then marked `completed` or `failed` from its summary.
//! The staged file is removed whatever the outcome.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{clamp_limit, new_upload_id, validate_spreadsheet, SalesUploadStatus};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{PipelineOutcome, SalesPipeline};

const HISTORY_DEFAULT_LIMIT: i64 = 10;
const HISTORY_MAX_LIMIT: i64 = 100;

/// Sales ingestion service
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
    pipeline: SalesPipeline,
    tmp_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesUpload {
    pub id: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Option<Uuid>,
    pub status: String,
    pub storage_url: String,
    pub processing_results: Option<Json<Value>>,
    pub sales_created: i32,
    pub ingredients_updated: i32,
    pub errors: Json<Vec<Value>>,
    pub warnings: Json<Vec<Value>>,
    pub processing_time_ms: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

const UPLOAD_COLUMNS: &str = "id, filename, uploaded_at, uploaded_by, status, storage_url, \
     processing_results, sales_created, ingredients_updated, errors, warnings, \
     processing_time_ms, completed_at, updated_at";

/// What the caller learns about a finished upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub upload_id: String,
    pub status: SalesUploadStatus,
    pub processing_results: Value,
    pub errors: Vec<Value>,
    pub warnings: Vec<Value>,
    pub processing_time_ms: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Row counts reported by the pipeline never go negative
fn reported_count(value: Option<i64>) -> i32 {
    value
        .unwrap_or(0)
        .clamp(0, i64::from(i32::MAX)) as i32
}

impl SalesService {
    pub fn new(db: PgPool, pipeline: SalesPipeline, tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            pipeline,
            tmp_dir: tmp_dir.into(),
        }
    }

    async fn stage(&self, upload_id: &str, ext: &str, data: &[u8]) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.tmp_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {}", e)))?;

        let path = self.tmp_dir.join(format!("{}.{}", upload_id, ext));
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;

        tracing::info!("Staged sales upload {} at {}", upload_id, path.display());
        Ok(path)
    }

    async fn discard(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to remove staged upload {}: {}", path.display(), e);
        }
    }

    /// Ingest a sales spreadsheet through the pipeline
    pub async fn upload(&self, filename: &str, data: &[u8], uploaded_by: Uuid) -> AppResult<UploadResult> {
        let ext = validate_spreadsheet(filename)?;
        if data.is_empty() {
            return Err(AppError::ValidationError("Arquivo vazio".to_string()));
        }

        let upload_id = new_upload_id();
        let path = self.stage(&upload_id, ext, data).await?;
        let storage_url = format!("file://{}", path.display());

        let outcome = match self.record_upload(&upload_id, filename, &storage_url, uploaded_by).await {
            Ok(()) => self.pipeline.run(&path, &upload_id).await,
            Err(e) => Err(e),
        };
        Self::discard(&path).await;

        match outcome {
            Ok(outcome) => self.finish(&upload_id, outcome).await,
            Err(e) => {
                if let Err(update_err) = self.mark_failed(&upload_id, &e.to_string()).await {
                    tracing::error!("Failed to mark upload {} as failed: {}", upload_id, update_err);
                }
                Err(e)
            }
        }
    }

    async fn record_upload(
        &self,
        upload_id: &str,
        filename: &str,
        storage_url: &str,
        uploaded_by: Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales_uploads (id, filename, uploaded_by, status, storage_url)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(upload_id)
        .bind(filename)
        .bind(uploaded_by)
        .bind(SalesUploadStatus::Processing.as_str())
        .bind(storage_url)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn finish(&self, upload_id: &str, outcome: PipelineOutcome) -> AppResult<UploadResult> {
        let status = if outcome.succeeded() {
            SalesUploadStatus::Completed
        } else {
            SalesUploadStatus::Failed
        };

        sqlx::query(
            r#"
            UPDATE sales_uploads
            SET status = $2, processing_results = $3, sales_created = $4,
                ingredients_updated = $5, errors = $6, warnings = $7,
                processing_time_ms = $8, completed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(upload_id)
        .bind(status.as_str())
        .bind(Json(&outcome.steps))
        .bind(reported_count(outcome.sales_created))
        .bind(reported_count(outcome.ingredients_updated))
        .bind(Json(&outcome.errors))
        .bind(Json(&outcome.warnings))
        .bind(outcome.processing_time_ms)
        .execute(&self.db)
        .await?;

        tracing::info!("Sales upload {} finished: {}", upload_id, status);

        Ok(UploadResult {
            upload_id: upload_id.to_string(),
            status,
            processing_results: outcome.steps,
            errors: outcome.errors,
            warnings: outcome.warnings,
            processing_time_ms: outcome.processing_time_ms,
        })
    }

    async fn mark_failed(&self, upload_id: &str, error: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE sales_uploads
            SET status = $2, errors = $3, completed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(upload_id)
        .bind(SalesUploadStatus::Failed.as_str())
        .bind(Json(json!([{ "message": error }])))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Most recent uploads first
    pub async fn history(&self, query: HistoryQuery) -> AppResult<Vec<SalesUpload>> {
        let limit = clamp_limit(query.limit, HISTORY_DEFAULT_LIMIT, HISTORY_MAX_LIMIT);

        let uploads = sqlx::query_as::<_, SalesUpload>(&format!(
            "SELECT {} FROM sales_uploads ORDER BY uploaded_at DESC LIMIT $1",
            UPLOAD_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(uploads)
    }

    pub async fn get_upload(&self, id: &str) -> AppResult<SalesUpload> {
        sqlx::query_as::<_, SalesUpload>(&format!(
            "SELECT {} FROM sales_uploads WHERE id = $1",
            UPLOAD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload não encontrado".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_count_is_clamped() {
        assert_eq!(reported_count(None), 0);
        assert_eq!(reported_count(Some(-3)), 0);
        assert_eq!(reported_count(Some(42)), 42);
        assert_eq!(reported_count(Some(i64::MAX)), i32::MAX);
    }
}
