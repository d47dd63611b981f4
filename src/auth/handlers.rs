use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        credentials,
        dto::{
            PublicUser, RegisterRequest, RegisterResponse, SessionResponse, SessionUser,
            SignInRequest, SignInResponse, SignOutResponse,
        },
        extractors::CurrentUser,
        guard::RequireSession,
        jwt::JwtKeys,
        redirect::RedirectPolicy,
        services::{self, validate_registration},
        session::{clear_session_cookie, session_cookie},
    },
    error::{AppError, FieldError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/session", get(get_session))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub fn page_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "malformed registration body");
        AppError::Validation(vec![FieldError::new("body", e.body_text())])
    })?;

    let registration = validate_registration(payload)
        .inspect_err(|_| warn!("registration failed validation"))?;

    let user = services::register(
        state.users.as_ref(),
        state.config.auth.bcrypt_cost,
        registration,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "malformed sign-in body");
        AppError::InvalidCredentials
    })?;

    let user = credentials::authorize(state.users.as_ref(), &payload.email, &payload.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let keys = JwtKeys::from_ref(&state);
    let (token, expires) = keys.sign(&user)?;

    let policy = RedirectPolicy::from_config(&state.config.auth);
    let url = policy.resolve(payload.callback_url.as_deref().unwrap_or("/"));

    let cookie = session_cookie(&token, keys.ttl.as_secs(), state.config.auth.secure_cookies());
    info!(user_id = %user.id, "user signed in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SignInResponse {
            url,
            token,
            expires,
            user,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn sign_out(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_session_cookie(state.config.auth.secure_cookies());
    (
        [(header::SET_COOKIE, cookie)],
        Json(SignOutResponse { url: "/".into() }),
    )
}

pub async fn get_session(session: Option<CurrentUser>) -> Json<Option<SessionResponse>> {
    Json(session.map(|CurrentUser(claims)| SessionResponse {
        user: claims.user(),
        expires: claims.expires_at(),
    }))
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "session refers to a missing user");
            AppError::Unauthenticated
        })?;
    Ok(Json(user.into()))
}

/// The dashboard only needs what the session already carries.
pub async fn dashboard(RequireSession(claims): RequireSession) -> Json<SessionUser> {
    Json(claims.user())
}
