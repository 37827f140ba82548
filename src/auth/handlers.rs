use axum::{
    extract::{rejection::JsonRejection, FromRef, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, CallbackQuery, GoogleLoginResponse, LoginRequest, RegisterRequest, UserResponse},
    google::OAuthError,
    services::{is_valid_email, AuthService, MIN_PASSWORD_LEN},
};
use crate::{
    error::AppError,
    response::{data, Data},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Data<UserResponse>>), AppError> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("invalid email".into()));
    }

    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let auth = AuthService::from_ref(&state);
    let user = auth.register(name, &email, &payload.password).await?;

    Ok((StatusCode::CREATED, data(UserResponse { user })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Data<AuthResponse>>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }

    let auth = AuthService::from_ref(&state);
    let (token, user) = auth.login(&email, &payload.password).await?;

    Ok(data(AuthResponse { token, user }))
}

#[instrument(skip(state))]
pub async fn google_login(
    State(state): State<AppState>,
) -> Result<Json<Data<GoogleLoginResponse>>, AppError> {
    let google = state.google.as_ref().ok_or(AppError::OAuthNotConfigured)?;

    let csrf_state = Uuid::new_v4().to_string();
    let auth_url = google.authorize_url(&csrf_state);

    Ok(data(GoogleLoginResponse {
        auth_url,
        state: csrf_state,
    }))
}

#[instrument(skip(state, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Data<AuthResponse>>, AppError> {
    let google = state.google.as_ref().ok_or(AppError::OAuthNotConfigured)?;

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("code query param missing".into()))?;

    let access_token = google.exchange_code(&code).await?;
    let profile = google.fetch_profile(&access_token).await?;

    let email = normalize_email(&profile.email);
    if !profile.email_verified {
        warn!(%email, "refusing unverified provider email");
        return Err(OAuthError::UnverifiedEmail(email).into());
    }
    let name = if profile.name.trim().is_empty() {
        email.clone()
    } else {
        profile.name.trim().to_string()
    };

    let auth = AuthService::from_ref(&state);
    let user = auth
        .find_or_create_oauth_user(&name, &email, google.provider(), &profile.provider_id)
        .await?;
    let token = auth.generate_token(&user)?;

    info!(user_id = %user.id, provider = google.provider(), "oauth login");
    Ok(data(AuthResponse { token, user }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
