use std::path::Path as FsPath;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, State,
    },
    routing::{get, patch},
    Json, Router,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{
    dto::UpdateAccountRequest,
    repo_types::{ChannelProfile, PublicUser, User, WatchedVideo},
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    media::{upload_staged, MultipartForm},
    response::ApiResponse,
    state::AppState,
    validation::{normalize_email, required},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users/current-user", get(current_user))
        .route("/users/c/:username", get(channel_profile))
        .route("/users/history", get(watch_history))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/users/update-account", patch(update_account))
        .route("/users/avatar", patch(update_avatar))
        .route("/users/cover-image", patch(update_cover_image))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

/// Missing rows for an authenticated id mean the account is gone.
fn existing(user: Option<User>, user_id: Uuid) -> AppResult<User> {
    user.ok_or_else(|| {
        error!(%user_id, "authenticated user not found");
        AppError::Unauthorized("Invalid access token".into())
    })
}

#[instrument(skip(state))]
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<ApiResponse<PublicUser>> {
    let user = existing(state.users.find_by_id(user_id).await?, user_id)?;
    Ok(ApiResponse::ok(
        PublicUser::from(user),
        "Current user fetched successfully",
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> AppResult<ApiResponse<PublicUser>> {
    let Json(payload) = payload?;
    let full_name = required(payload.full_name.as_deref(), "All fields are required")?;
    let email = required(payload.email.as_deref(), "All fields are required")?;
    let email = normalize_email(email)?;

    let user = state.users.update_account(user_id, full_name, &email).await?;
    let user = existing(user, user_id)?;
    info!(%user_id, "account details updated");
    Ok(ApiResponse::ok(
        PublicUser::from(user),
        "Account details updated successfully",
    ))
}

/// Which image column a single-file upload replaces.
#[derive(Debug, Clone, Copy)]
enum ImageSlot {
    Avatar,
    CoverImage,
}

impl ImageSlot {
    fn field(self) -> &'static str {
        match self {
            ImageSlot::Avatar => "avatar",
            ImageSlot::CoverImage => "coverImage",
        }
    }
}

async fn replace_image(
    state: &AppState,
    user_id: Uuid,
    mp: Multipart,
    slot: ImageSlot,
) -> AppResult<User> {
    let form = MultipartForm::read(mp, FsPath::new(&state.config.media.temp_dir)).await?;
    let file = form.file(slot.field()).ok_or_else(|| {
        AppError::Validation(match slot {
            ImageSlot::Avatar => "Avatar file is missing".into(),
            ImageSlot::CoverImage => "Cover image file is missing".into(),
        })
    })?;

    let media = upload_staged(state.media.as_ref(), Some(file))
        .await
        .ok_or_else(|| {
            AppError::UploadFailed(match slot {
                ImageSlot::Avatar => "Error while uploading avatar".into(),
                ImageSlot::CoverImage => "Error while uploading cover image".into(),
            })
        })?;

    let user = match slot {
        ImageSlot::Avatar => state.users.update_avatar(user_id, &media.url).await?,
        ImageSlot::CoverImage => state.users.update_cover_image(user_id, &media.url).await?,
    };
    info!(%user_id, ?slot, url = %media.url, "image replaced");
    existing(user, user_id)
}

#[instrument(skip(state, mp))]
pub async fn update_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResponse<PublicUser>> {
    let user = replace_image(&state, user_id, mp?, ImageSlot::Avatar).await?;
    Ok(ApiResponse::ok(
        PublicUser::from(user),
        "Avatar updated successfully",
    ))
}

#[instrument(skip(state, mp))]
pub async fn update_cover_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResponse<PublicUser>> {
    let user = replace_image(&state, user_id, mp?, ImageSlot::CoverImage).await?;
    Ok(ApiResponse::ok(
        PublicUser::from(user),
        "Cover image updated successfully",
    ))
}

#[instrument(skip(state))]
pub async fn channel_profile(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ChannelProfile>> {
    let username = required(Some(username.as_str()), "username is missing")?.to_lowercase();

    let channel = state
        .users
        .channel_profile(&username, viewer)
        .await?
        .ok_or_else(|| AppError::NotFound("Channel does not exist".into()))?;

    Ok(ApiResponse::ok(channel, "User channel fetched successfully"))
}

#[instrument(skip(state))]
pub async fn watch_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<ApiResponse<Vec<WatchedVideo>>> {
    let history = state.users.watch_history(user_id).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}
