use axum::async_trait;
use uuid::Uuid;

use super::repo_types::{ChannelProfile, NewUser, User, WatchedVideo};
use crate::error::AppResult;

/// Persistence seam for user records and the reads built on them.
///
/// Lookups that find nothing return `Ok(None)`; callers decide what absence
/// means. Every write touches a single user row.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Matches a user whose username equals `username` or whose email equals
    /// `email`. Both inputs are expected to be normalized already.
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>>;

    async fn create(&self, user: NewUser) -> AppResult<User>;

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    /// Overwrites the active refresh token, or clears it with `None`.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> AppResult<()>;

    /// Replaces `current` with `next` only if `current` is still the stored
    /// token. Returns whether the swap happened.
    async fn rotate_refresh_token(&self, id: Uuid, current: &str, next: &str) -> AppResult<bool>;

    async fn update_account(&self, id: Uuid, full_name: &str, email: &str) -> AppResult<Option<User>>;

    async fn update_avatar(&self, id: Uuid, avatar_url: &str) -> AppResult<Option<User>>;

    async fn update_cover_image(&self, id: Uuid, cover_image_url: &str) -> AppResult<Option<User>>;

    /// Channel view of `username` with subscription counts; `viewer` decides
    /// `is_subscribed`.
    async fn channel_profile(&self, username: &str, viewer: Uuid) -> AppResult<Option<ChannelProfile>>;

    /// Watched videos of `user_id`, most recent first.
    async fn watch_history(&self, user_id: Uuid) -> AppResult<Vec<WatchedVideo>>;
}
