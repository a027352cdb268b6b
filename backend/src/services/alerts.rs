//! Operational alerts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{clamp_limit, require_text, AlertPriority, AlertStats, AlertStatus, AlertType};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const ALERTS_DEFAULT_LIMIT: i64 = 50;
const ALERTS_MAX_LIMIT: i64 = 200;

/// Alert service
#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Alert {
    pub id: Uuid,
    pub alert_type: String,
    pub priority: String,
    pub title: String,
    pub message: String,
    pub related_id: Option<String>,
    pub status: String,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_via_task: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

const ALERT_COLUMNS: &str = "id, alert_type, priority, title, message, related_id, status, \
     resolved_by, resolved_at, resolved_via_task, created_at";

#[derive(Debug, Deserialize)]
pub struct CreateAlertInput {
    pub alert_type: Option<AlertType>,
    pub priority: Option<AlertPriority>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub related_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    pub status: Option<AlertStatus>,
    pub priority: Option<AlertPriority>,
    pub alert_type: Option<AlertType>,
    pub limit: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct AlertFacets {
    priority: String,
    alert_type: String,
}

impl AlertService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: AlertQuery) -> AppResult<Vec<Alert>> {
        let limit = clamp_limit(query.limit, ALERTS_DEFAULT_LIMIT, ALERTS_MAX_LIMIT);

        let alerts = sqlx::query_as::<_, Alert>(&format!(
            r#"
            SELECT {}
            FROM alerts
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR priority = $2)
              AND ($3::TEXT IS NULL OR alert_type = $3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
            ALERT_COLUMNS
        ))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.priority.map(|p| p.as_str()))
        .bind(query.alert_type.map(|t| t.as_str()))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(alerts)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Alert> {
        sqlx::query_as::<_, Alert>(&format!("SELECT {} FROM alerts WHERE id = $1", ALERT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Alerta não encontrado".to_string()))
    }

    pub async fn create(&self, input: CreateAlertInput) -> AppResult<Alert> {
        let missing = || AppError::ValidationError("Campos obrigatórios não preenchidos".to_string());
        let alert_type = input.alert_type.ok_or_else(missing)?;
        let priority = input.priority.ok_or_else(missing)?;
        let title = require_text(input.title.as_deref())?;
        let message = require_text(input.message.as_deref())?;

        let alert = sqlx::query_as::<_, Alert>(&format!(
            r#"
            INSERT INTO alerts (alert_type, priority, title, message, related_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(alert_type.as_str())
        .bind(priority.as_str())
        .bind(title)
        .bind(message)
        .bind(&input.related_id)
        .bind(AlertStatus::Pending.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(alert)
    }

    /// Pending alerts broken down by priority and type
    pub async fn stats(&self) -> AppResult<AlertStats> {
        let facets = sqlx::query_as::<_, AlertFacets>(
            "SELECT priority, alert_type FROM alerts WHERE status = $1",
        )
        .bind(AlertStatus::Pending.as_str())
        .fetch_all(&self.db)
        .await?;

        Ok(AlertStats::tally(
            facets
                .iter()
                .map(|f| (f.priority.parse().ok(), f.alert_type.parse().ok())),
        ))
    }

    /// Resolve a pending alert because the task created for it was done
    pub async fn resolve_via_task(&self, alert_id: Uuid, resolved_by: Uuid, task_id: Uuid) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE alerts
            SET status = $1, resolved_by = $2, resolved_at = NOW(), resolved_via_task = $3
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(AlertStatus::Resolved.as_str())
        .bind(resolved_by)
        .bind(task_id)
        .bind(alert_id)
        .bind(AlertStatus::Pending.as_str())
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Alerta pendente não encontrado".to_string()));
        }
        Ok(())
    }
}
