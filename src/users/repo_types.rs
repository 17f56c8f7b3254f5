use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,       // lowercase, unique
    pub email: String,          // lowercase, unique
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub password_hash: String,  // Argon2 PHC string
    pub refresh_token: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields needed to insert a user; the hash is computed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub password_hash: String,
}

/// User as returned to clients: no password hash, no refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar: u.avatar_url,
            cover_image: u.cover_image_url.unwrap_or_default(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(skip_serializing)]
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    #[serde(rename = "coverImage")]
    pub cover_image_url: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// Owner projection embedded in each watch-history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub full_name: String,
    pub username: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedVideo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub watched_at: OffsetDateTime,
    pub owner: Option<VideoOwner>,
}

/// Flat row for the watch-history join; folded into [`WatchedVideo`].
#[derive(Debug, FromRow)]
pub struct WatchedVideoRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: i64,
    pub created_at: OffsetDateTime,
    pub watched_at: OffsetDateTime,
    pub owner_full_name: Option<String>,
    pub owner_username: Option<String>,
    pub owner_avatar_url: Option<String>,
}

impl From<WatchedVideoRow> for WatchedVideo {
    fn from(r: WatchedVideoRow) -> Self {
        let owner = match (r.owner_full_name, r.owner_username, r.owner_avatar_url) {
            (Some(full_name), Some(username), Some(avatar)) => Some(VideoOwner {
                full_name,
                username,
                avatar,
            }),
            _ => None,
        };
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            video_file: r.video_file_url,
            thumbnail: r.thumbnail_url,
            duration: r.duration_seconds,
            views: r.views,
            created_at: r.created_at,
            watched_at: r.watched_at,
            owner,
        }
    }
}
