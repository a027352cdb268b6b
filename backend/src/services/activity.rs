//! Activity feed
//!
//! Mutations record who did what. Recording never fails the caller: errors
//! are logged and dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{clamp_limit, ActivityAction, EntityType, ACTIVITY_DEFAULT_LIMIT, ACTIVITY_MAX_LIMIT};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// Staff member performing a change
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
}

/// Activity service
#[derive(Clone)]
pub struct ActivityService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub action: String,
    pub actor_id: Option<Uuid>,
    pub actor_name: String,
    pub entity_type: String,
    pub entity_id: String,
    pub summary: String,
    pub details: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
}

/// Query filters for the feed
#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub entity_type: Option<EntityType>,
    pub actor_id: Option<Uuid>,
    pub entity_id: Option<String>,
    pub limit: Option<i64>,
}

impl ActivityService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append an entry; failures only produce a warning
    pub async fn record(
        &self,
        actor: &Actor,
        action: ActivityAction,
        entity_type: EntityType,
        entity_id: impl ToString,
        summary: impl Into<String>,
        details: Option<Value>,
    ) {
        let entity_id = entity_id.to_string();
        let result = sqlx::query(
            r#"
            INSERT INTO activity_log (action, actor_id, actor_name, entity_type, entity_id, summary, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(action.as_str())
        .bind(actor.id)
        .bind(&actor.name)
        .bind(entity_type.as_str())
        .bind(&entity_id)
        .bind(summary.into())
        .bind(details.map(Json))
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                "Failed to record activity {} on {} {}: {}",
                action,
                entity_type,
                entity_id,
                e
            );
        }
    }

    /// Most recent entries first
    pub async fn list(&self, query: ActivityQuery) -> AppResult<Vec<ActivityEntry>> {
        let limit = clamp_limit(query.limit, ACTIVITY_DEFAULT_LIMIT, ACTIVITY_MAX_LIMIT);

        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, action, actor_id, actor_name, entity_type, entity_id, summary, details, created_at
            FROM activity_log
            WHERE ($1::TEXT IS NULL OR entity_type = $1)
              AND ($2::UUID IS NULL OR actor_id = $2)
              AND ($3::TEXT IS NULL OR entity_id = $3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(query.entity_type.map(|t| t.as_str()))
        .bind(query.actor_id)
        .bind(query.entity_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}
