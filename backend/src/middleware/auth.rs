//! Authentication middleware
//!
//! Bearer tokens are verified against the identity provider's signing secret.
//! Handlers that need the staff profile use the [`Staff`] extractor, which
//! resolves the `users` row behind the token.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use shared::UserRole;
use uuid::Uuid;

use crate::error::{AppError, ErrorResponse};
use crate::external::identity::verify_token;
use crate::services::Actor;
use crate::AppState;

/// Identity behind a verified bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// Identity provider account id
    pub uid: String,
    pub email: Option<String>,
}

/// Validates the bearer token and stores an [`AuthUser`] in request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return unauthorized_response("Token de autenticação ausente");
    };

    let identity = &state.config.identity;
    let claims = match verify_token(bearer.token(), &identity.jwt_secret, identity.issuer.as_deref()) {
        Ok(claims) => claims,
        Err(msg) => {
            tracing::debug!("Rejected bearer token: {}", msg);
            return unauthorized_response("Token inválido ou expirado");
        }
    };

    request.extensions_mut().insert(AuthUser {
        uid: claims.sub,
        email: claims.email,
    });

    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("UNAUTHORIZED", message)),
    )
        .into_response()
}

/// Extractor for the verified token identity
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("UNAUTHORIZED", "Autenticação necessária")),
                )
            })
    }
}

/// Staff profile of the caller
#[derive(Clone, Debug)]
pub struct Staff {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl Staff {
    /// Who activity entries are attributed to
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Apenas administradores podem realizar esta ação".to_string(),
            ))
        }
    }
}

#[derive(sqlx::FromRow)]
struct StaffRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Staff {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized("Autenticação necessária".to_string()))?;

        let row = sqlx::query_as::<_, StaffRow>(
            r#"
            SELECT id, name, email, role
            FROM users
            WHERE auth_uid = $1 AND status IN ('active', 'invited')
            "#,
        )
        .bind(&user.uid)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::Forbidden("Usuário sem cadastro ativo".to_string()))?;

        Ok(Staff {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse()?,
        })
    }
}
