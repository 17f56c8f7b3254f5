use axum::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::repo_types::{ChannelProfile, NewUser, User, WatchedVideo, WatchedVideoRow};
use super::store::UserStore;
use crate::error::AppResult;

const USER_COLUMNS: &str = r#"
    id, username, email, full_name, avatar_url, cover_image_url,
    password_hash, refresh_token, created_at, updated_at
"#;

/// Postgres-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn update_returning(&self, sql: &str, id: Uuid, value: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(sql)
            .bind(id)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $2 LIMIT 1"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar_url, cover_image_url, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar_url)
        .bind(&user.cover_image_url)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await?;
        debug!(user_id = %created.id, "user inserted");
        Ok(created)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> AppResult<()> {
        sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn rotate_refresh_token(&self, id: Uuid, current: &str, next: &str) -> AppResult<bool> {
        let res = sqlx::query(
            "UPDATE users SET refresh_token = $3 WHERE id = $1 AND refresh_token = $2",
        )
        .bind(id)
        .bind(current)
        .bind(next)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn update_account(&self, id: Uuid, full_name: &str, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET full_name = $2, email = $3, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(full_name)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_avatar(&self, id: Uuid, avatar_url: &str) -> AppResult<Option<User>> {
        self.update_returning(
            &format!(
                "UPDATE users SET avatar_url = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
            ),
            id,
            avatar_url,
        )
        .await
    }

    async fn update_cover_image(&self, id: Uuid, cover_image_url: &str) -> AppResult<Option<User>> {
        self.update_returning(
            &format!(
                "UPDATE users SET cover_image_url = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
            ),
            id,
            cover_image_url,
        )
        .await
    }

    async fn channel_profile(&self, username: &str, viewer: Uuid) -> AppResult<Option<ChannelProfile>> {
        let profile = sqlx::query_as::<_, ChannelProfile>(
            r#"
            SELECT u.id, u.full_name, u.username, u.email, u.avatar_url, u.cover_image_url,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id)
                       AS subscribers_count,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id)
                       AS channels_subscribed_to_count,
                   EXISTS (
                       SELECT 1 FROM subscriptions s
                        WHERE s.channel_id = u.id AND s.subscriber_id = $2
                   ) AS is_subscribed
              FROM users u
             WHERE u.username = $1
            "#,
        )
        .bind(username)
        .bind(viewer)
        .fetch_optional(&self.db)
        .await?;
        Ok(profile)
    }

    async fn watch_history(&self, user_id: Uuid) -> AppResult<Vec<WatchedVideo>> {
        let rows = sqlx::query_as::<_, WatchedVideoRow>(
            r#"
            SELECT v.id, v.title, v.description, v.video_file_url, v.thumbnail_url,
                   v.duration_seconds, v.views, v.created_at, w.watched_at,
                   o.full_name AS owner_full_name,
                   o.username  AS owner_username,
                   o.avatar_url AS owner_avatar_url
              FROM watch_history w
              JOIN videos v ON v.id = w.video_id
              LEFT JOIN users o ON o.id = v.owner_id
             WHERE w.user_id = $1
             ORDER BY w.watched_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(WatchedVideo::from).collect())
    }
}
