//! Authentication and onboarding handlers

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use shared::{ActivityAction, EntityType};

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Staff};
use crate::models::ApiResponse;
use crate::services::auth::{Invitation, InviteInput, ResendInviteInput, SetupOwnerInput};
use crate::services::staff::StaffMember;
use crate::services::{ActivityService, AuthService};
use crate::AppState;

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), state.identity.clone())
}

/// Bootstrap the first administrator (public)
pub async fn setup_owner(
    State(state): State<AppState>,
    Json(body): Json<SetupOwnerInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<StaffMember>>)> {
    let owner = auth_service(&state).setup_owner(body).await?;
    tracing::info!("Owner account created for {}", owner.email);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(owner).with_message("Administrador criado com sucesso")),
    ))
}

/// Invite a staff member (admin only)
pub async fn invite_staff(
    State(state): State<AppState>,
    staff: Staff,
    Json(body): Json<InviteInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Invitation>>)> {
    staff.require_admin()?;

    let invitation = auth_service(&state).invite(staff.id, body).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Invited,
            EntityType::User,
            invitation.user.id,
            format!("Convidou {}", invitation.user.name),
            Some(json!({ "email": invitation.user.email, "role": invitation.user.role })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(invitation))))
}

/// Issue a fresh invite link for a pending invitation (admin only)
pub async fn resend_invite(
    State(state): State<AppState>,
    staff: Staff,
    Json(body): Json<ResendInviteInput>,
) -> AppResult<Json<ApiResponse<Invitation>>> {
    staff.require_admin()?;

    let invitation = auth_service(&state).resend_invite(body.user_id).await?;
    Ok(Json(ApiResponse::ok(invitation).with_message("Convite reenviado")))
}

/// Profile of the signed-in user
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<StaffMember>>> {
    let profile = auth_service(&state).me(&user.uid).await?;
    Ok(Json(ApiResponse::ok(profile)))
}
