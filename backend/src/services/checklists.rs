//! Checklist tasks and the templates they can be stamped from

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    completion_change, require_text, TaskOrigin, TaskPriority, TaskStatus, DEFAULT_TASK_CATEGORY,
};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::alerts::AlertService;

/// Checklist service
#[derive(Clone)]
pub struct ChecklistService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub completed: bool,
    pub due_date: NaiveDate,
    pub origin: String,
    pub priority: String,
    pub category: String,
    pub assigned_to: Option<Uuid>,
    pub alert_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const TASK_COLUMNS: &str = "id, title, description, status, completed, due_date, origin, \
     priority, category, assigned_to, alert_id, template_id, completed_at, completed_by, \
     created_by, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChecklistTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub role: Option<String>,
    pub tasks: Json<Vec<String>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

const TEMPLATE_COLUMNS: &str = "id, name, description, role, tasks, created_by, created_at";

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub assigned_to: Option<Uuid>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub origin: Option<TaskOrigin>,
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
    pub alert_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    pub completed: Option<bool>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyTemplateInput {
    pub template_id: Uuid,
    /// Who the stamped tasks are assigned to
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl ChecklistService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open and completed tasks, newest first; cancelled tasks are hidden
    pub async fn list_tasks(&self, query: TaskQuery) -> AppResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE status <> $1
              AND ($2::UUID IS NULL OR assigned_to = $2)
              AND ($3::BOOLEAN IS NULL OR completed = $3)
            ORDER BY created_at DESC
            "#,
            TASK_COLUMNS
        ))
        .bind(TaskStatus::Cancelada.as_str())
        .bind(query.assigned_to)
        .bind(query.completed)
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    pub async fn get_task(&self, id: Uuid) -> AppResult<Task> {
        sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Tarefa não encontrada".to_string()))
    }

    pub async fn create_task(&self, input: CreateTaskInput, created_by: Uuid) -> AppResult<Task> {
        let title = require_text(input.title.as_deref())?;
        let due_date = input.due_date.unwrap_or_else(|| Utc::now().date_naive());
        let origin = input.origin.unwrap_or(TaskOrigin::Manual);
        let priority = input.priority.unwrap_or(TaskPriority::Media);
        let category = input
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TASK_CATEGORY.to_string());

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (
                title, description, status, completed, due_date, origin, priority,
                category, assigned_to, alert_id, created_by
            )
            VALUES ($1, $2, $3, FALSE, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(title)
        .bind(input.description.unwrap_or_default())
        .bind(TaskStatus::Pendente.as_str())
        .bind(due_date)
        .bind(origin.as_str())
        .bind(priority.as_str())
        .bind(&category)
        .bind(input.assigned_to)
        .bind(input.alert_id)
        .bind(created_by)
        .fetch_one(&self.db)
        .await?;

        Ok(task)
    }

    /// Update a task. Completing one that was raised from an alert resolves
    /// the alert too; that side effect never fails the update.
    pub async fn update_task(&self, id: Uuid, input: UpdateTaskInput, user_id: Uuid) -> AppResult<Task> {
        let existing = self.get_task(id).await?;

        let title = match input.title.as_deref() {
            Some(t) => require_text(Some(t))?.to_string(),
            None => existing.title.clone(),
        };
        let priority = input
            .priority
            .map(|p| p.as_str().to_string())
            .unwrap_or(existing.priority.clone());
        let assigned_to = input.assigned_to.or(existing.assigned_to);

        let (completed, mut status, completed_at, completed_by) = match input.completed {
            Some(flag) => {
                let change = completion_change(flag, user_id, Utc::now());
                (
                    change.completed,
                    change.status.as_str().to_string(),
                    change.completed_at,
                    change.completed_by,
                )
            }
            None => (
                existing.completed,
                existing.status.clone(),
                existing.completed_at,
                existing.completed_by,
            ),
        };
        if let Some(explicit) = input.status {
            status = explicit.as_str().to_string();
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $2, priority = $3, assigned_to = $4, completed = $5, status = $6,
                completed_at = $7, completed_by = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(&title)
        .bind(&priority)
        .bind(assigned_to)
        .bind(completed)
        .bind(&status)
        .bind(completed_at)
        .bind(completed_by)
        .fetch_one(&self.db)
        .await?;

        if input.completed == Some(true) {
            if let Some(alert_id) = existing.alert_id {
                match AlertService::new(self.db.clone())
                    .resolve_via_task(alert_id, user_id, id)
                    .await
                {
                    Ok(()) => tracing::info!("Alert {} resolved via task {}", alert_id, id),
                    Err(e) => tracing::warn!("Failed to resolve alert {}: {}", alert_id, e),
                }
            }
        }

        Ok(task)
    }

    /// Soft delete: the task moves to cancelada
    pub async fn cancel_task(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE tasks SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(TaskStatus::Cancelada.as_str())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Tarefa não encontrada".to_string()));
        }
        Ok(())
    }

    /// Stamp one pending task per template title, all due today
    pub async fn apply_template(&self, input: ApplyTemplateInput, created_by: Uuid) -> AppResult<Vec<Task>> {
        let template = self.get_template(input.template_id).await?;
        let today = Utc::now().date_naive();

        let mut tx = self.db.begin().await?;
        let mut created = Vec::with_capacity(template.tasks.len());
        for title in template.tasks.iter() {
            let task = sqlx::query_as::<_, Task>(&format!(
                r#"
                INSERT INTO tasks (
                    title, description, status, completed, due_date, origin, priority,
                    category, assigned_to, template_id, created_by
                )
                VALUES ($1, '', $2, FALSE, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {}
                "#,
                TASK_COLUMNS
            ))
            .bind(title)
            .bind(TaskStatus::Pendente.as_str())
            .bind(today)
            .bind(TaskOrigin::Template.as_str())
            .bind(TaskPriority::Media.as_str())
            .bind(DEFAULT_TASK_CATEGORY)
            .bind(input.user_id)
            .bind(template.id)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;
            created.push(task);
        }
        tx.commit().await?;

        Ok(created)
    }

    pub async fn list_templates(&self) -> AppResult<Vec<ChecklistTemplate>> {
        let templates = sqlx::query_as::<_, ChecklistTemplate>(&format!(
            "SELECT {} FROM checklist_templates ORDER BY name",
            TEMPLATE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(templates)
    }

    pub async fn get_template(&self, id: Uuid) -> AppResult<ChecklistTemplate> {
        sqlx::query_as::<_, ChecklistTemplate>(&format!(
            "SELECT {} FROM checklist_templates WHERE id = $1",
            TEMPLATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Template não encontrado".to_string()))
    }

    pub async fn create_template(
        &self,
        input: CreateTemplateInput,
        created_by: Uuid,
    ) -> AppResult<ChecklistTemplate> {
        let name = require_text(input.name.as_deref())?;
        let tasks: Vec<String> = input
            .tasks
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tasks.is_empty() {
            return Err(AppError::ValidationError(
                "O template precisa de pelo menos uma tarefa".to_string(),
            ));
        }

        let template = sqlx::query_as::<_, ChecklistTemplate>(&format!(
            r#"
            INSERT INTO checklist_templates (name, description, role, tasks, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TEMPLATE_COLUMNS
        ))
        .bind(name)
        .bind(&input.description)
        .bind(&input.role)
        .bind(Json(&tasks))
        .bind(created_by)
        .fetch_one(&self.db)
        .await?;

        Ok(template)
    }
}
