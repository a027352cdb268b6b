//! Checklist task and template handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use shared::{ActivityAction, EntityType};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::Staff;
use crate::models::ApiResponse;
use crate::services::checklists::{
    ApplyTemplateInput, ChecklistTemplate, CreateTaskInput, CreateTemplateInput, Task, TaskQuery,
    UpdateTaskInput,
};
use crate::services::{ActivityService, ChecklistService};
use crate::AppState;

pub async fn list_tasks(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<TaskQuery>,
) -> AppResult<Json<ApiResponse<Vec<Task>>>> {
    let tasks = ChecklistService::new(state.db).list_tasks(query).await?;
    Ok(Json(ApiResponse::list(tasks)))
}

pub async fn create_task(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<CreateTaskInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Task>>)> {
    let task = ChecklistService::new(state.db.clone())
        .create_task(input, staff.id)
        .await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Created,
            EntityType::Task,
            task.id,
            format!("Criou a tarefa {}", task.title),
            None,
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(task))))
}

pub async fn update_task(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> AppResult<Json<ApiResponse<Task>>> {
    let completing = input.completed == Some(true);
    let task = ChecklistService::new(state.db.clone())
        .update_task(id, input, staff.id)
        .await?;

    let (action, summary) = if completing {
        (ActivityAction::Completed, format!("Concluiu a tarefa {}", task.title))
    } else {
        (ActivityAction::Updated, format!("Atualizou a tarefa {}", task.title))
    };
    ActivityService::new(state.db.clone())
        .record(&staff.actor(), action, EntityType::Task, task.id, summary, None)
        .await;

    Ok(Json(ApiResponse::ok(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    ChecklistService::new(state.db.clone()).cancel_task(id).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Cancelled,
            EntityType::Task,
            id,
            "Cancelou uma tarefa",
            None,
        )
        .await;

    Ok(Json(ApiResponse::message("Tarefa removida")))
}

/// Create one task per title of a template
pub async fn apply_checklist_template(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<ApplyTemplateInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vec<Task>>>)> {
    let template_id = input.template_id;
    let assignee = input.user_id;
    let tasks = ChecklistService::new(state.db.clone())
        .apply_template(input, staff.id)
        .await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Created,
            EntityType::ChecklistTemplate,
            template_id,
            format!("Aplicou um checklist com {} tarefas", tasks.len()),
            Some(json!({ "assigned_to": assignee })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::list(tasks))))
}

pub async fn list_checklist_templates(
    State(state): State<AppState>,
    _staff: Staff,
) -> AppResult<Json<ApiResponse<Vec<ChecklistTemplate>>>> {
    let templates = ChecklistService::new(state.db).list_templates().await?;
    Ok(Json(ApiResponse::list(templates)))
}

pub async fn create_checklist_template(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<CreateTemplateInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<ChecklistTemplate>>)> {
    let template = ChecklistService::new(state.db.clone())
        .create_template(input, staff.id)
        .await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Created,
            EntityType::ChecklistTemplate,
            template.id,
            format!("Criou o checklist {}", template.name),
            None,
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(template))))
}
