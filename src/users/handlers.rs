use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{UpdateUserRequest, UserResponse, UsersResponse},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    response::{data, Data},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("invalid user id".into()))
}

#[instrument(skip(state, _caller))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<Data<UsersResponse>>, AppError> {
    let users = services::list_users(state.users.as_ref()).await?;
    Ok(data(UsersResponse { users }))
}

#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Data<UserResponse>>, AppError> {
    let id = parse_id(&id)?;
    let user = services::get_user(state.users.as_ref(), id).await?;
    Ok(data(UserResponse { user }))
}

#[instrument(skip(state, _caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Data<UserResponse>>, AppError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    let user = services::rename_user(state.users.as_ref(), id, name).await?;
    Ok(data(UserResponse { user }))
}

#[instrument(skip(state, _caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    services::delete_user(state.users.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
