use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            normalize_email, AuthResponse, LoginRequest, PublicUser, RegisterRequest, Registration,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_decoy, verify_password},
        repo::{NewUser, User},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(payload) = payload?;
    let reg = Registration::try_from(payload).map_err(|e| {
        warn!(reason = %e, "register rejected");
        e
    })?;

    if state.users.find_by_email(&reg.email).await?.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(AppError::Conflict("email already registered".into()));
    }
    if state.users.find_by_username(&reg.username).await?.is_some() {
        warn!(username = %reg.username, "username already registered");
        return Err(AppError::Conflict("username already registered".into()));
    }

    let password_hash = hash_password(&reg.password)?;
    // The store re-checks uniqueness, which settles concurrent registrations.
    let user = state
        .users
        .create(NewUser {
            username: reg.username,
            email: reg.email,
            password_hash,
        })
        .await?;

    let response = issue_session(&state, user)?;
    info!(user_id = %response.user.id, "user registered");
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        verify_decoy(&payload.password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let response = issue_session(&state, user)?;
    info!(user_id = %response.user.id, "user logged in");
    Ok(Json(response))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

fn issue_session(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let token = JwtKeys::from_ref(state).sign(user.id)?;
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}
