use std::path::Path;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::{HeaderMap, HeaderName},
    response::AppendHeaders,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    cookies::{clear_cookie, get_cookie, set_cookie, ACCESS_COOKIE, REFRESH_COOKIE},
    dto::{ChangePasswordRequest, LoginData, LoginRequest, RefreshRequest, TokensData},
    extractors::AuthUser,
    jwt::TokenPair,
    password::hash_password,
    session::{LoginIdentity, SessionManager},
};
use crate::{
    error::{AppError, AppResult},
    media::{upload_staged, MultipartForm},
    response::{ApiResponse, Empty},
    state::AppState,
    users::repo_types::{NewUser, PublicUser},
    validation::{non_blank, normalize_email, required_raw},
};

type CookieHeaders = AppendHeaders<[(HeaderName, String); 2]>;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/register",
            post(register).layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB
        )
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/refresh-token", post(refresh))
        .route("/users/change-password", post(change_password))
}

fn session_cookies(tokens: &TokenPair, secure: bool) -> CookieHeaders {
    AppendHeaders([
        set_cookie(ACCESS_COOKIE, &tokens.access_token, secure),
        set_cookie(REFRESH_COOKIE, &tokens.refresh_token, secure),
    ])
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResponse<PublicUser>> {
    let form = MultipartForm::read(mp?, Path::new(&state.config.media.temp_dir)).await?;

    let fields = [
        form.text("fullName"),
        form.text("username"),
        form.text("email"),
        form.text("password"),
    ];
    if fields.iter().any(|f| non_blank(*f).is_none()) {
        return Err(AppError::Validation("All fields are required".into()));
    }
    let [full_name, username, email, password] = fields.map(|f| f.unwrap_or_default());
    let full_name = full_name.trim();
    let username = username.trim().to_lowercase();
    let email = normalize_email(email)?;

    if state
        .users
        .find_by_username_or_email(Some(username.as_str()), Some(email.as_str()))
        .await?
        .is_some()
    {
        warn!(%username, %email, "username or email already registered");
        return Err(AppError::Conflict(
            "User with email or username already exists".into(),
        ));
    }

    let avatar_file = form
        .file("avatar")
        .ok_or_else(|| AppError::Validation("Avatar file is required".into()))?;

    let avatar = upload_staged(state.media.as_ref(), Some(avatar_file))
        .await
        .ok_or_else(|| AppError::UploadFailed("Avatar uploading failed".into()))?;
    let cover_image = upload_staged(state.media.as_ref(), form.file("coverImage")).await;

    let password_hash = hash_password(password)?;
    let user = state
        .users
        .create(NewUser {
            username,
            email,
            full_name: full_name.to_string(),
            avatar_url: avatar.url.clone(),
            cover_image_url: cover_image.as_ref().map(|c| c.url.clone()),
            password_hash,
        })
        .await
        .map_err(|e| {
            // Uploaded media is left in place; there is no compensating delete.
            warn!(error = %e, avatar = %avatar.url, "user creation failed after upload");
            e
        })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(ApiResponse::created(
        PublicUser::from(user),
        "User registered successfully",
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    State(sessions): State<SessionManager>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieHeaders, ApiResponse<LoginData>)> {
    let Json(payload) = payload?;
    let username = non_blank(payload.username.as_deref()).map(str::to_lowercase);
    let email = non_blank(payload.email.as_deref()).map(str::to_lowercase);
    if username.is_none() && email.is_none() {
        return Err(AppError::Validation("username or email is required".into()));
    }
    let password = required_raw(payload.password.as_deref(), "password is required")?;

    let outcome = sessions
        .login(&LoginIdentity { username, email }, password)
        .await?;

    let cookies = session_cookies(&outcome.tokens, state.config.cookie_secure);
    Ok((
        cookies,
        ApiResponse::ok(
            LoginData {
                user: outcome.user,
                access_token: outcome.tokens.access_token,
                refresh_token: outcome.tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

#[instrument(skip(state, sessions))]
pub async fn logout(
    State(state): State<AppState>,
    State(sessions): State<SessionManager>,
    AuthUser(user_id): AuthUser,
) -> AppResult<(CookieHeaders, ApiResponse<Empty>)> {
    sessions.logout(user_id).await?;

    let secure = state.config.cookie_secure;
    Ok((
        AppendHeaders([
            clear_cookie(ACCESS_COOKIE, secure),
            clear_cookie(REFRESH_COOKIE, secure),
        ]),
        ApiResponse::ok(Empty {}, "User logged out successfully"),
    ))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    State(sessions): State<SessionManager>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieHeaders, ApiResponse<TokensData>)> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let presented = get_cookie(&headers, REFRESH_COOKIE).or(body.refresh_token.as_deref());

    let tokens = sessions.refresh(presented).await?;

    let cookies = session_cookies(&tokens, state.config.cookie_secure);
    Ok((
        cookies,
        ApiResponse::ok(
            TokensData {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "Access token refreshed successfully",
        ),
    ))
}

#[instrument(skip(sessions, payload))]
pub async fn change_password(
    State(sessions): State<SessionManager>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AppResult<ApiResponse<Empty>> {
    let Json(payload) = payload?;
    let old_password = required_raw(payload.old_password.as_deref(), "All fields are required")?;
    let new_password = required_raw(payload.new_password.as_deref(), "All fields are required")?;

    sessions
        .change_password(user_id, old_password, new_password)
        .await?;
    Ok(ApiResponse::ok(Empty {}, "Password changed successfully"))
}
