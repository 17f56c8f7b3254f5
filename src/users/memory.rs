//! In-memory [`UserStore`] used by unit and router tests.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ChannelProfile, NewUser, User, VideoOwner, WatchedVideo};
use super::store::UserStore;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct StoredVideo {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub created_at: OffsetDateTime,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// (subscriber, channel)
    subscriptions: Vec<(Uuid, Uuid)>,
    videos: HashMap<Uuid, StoredVideo>,
    /// (user, video, watched_at)
    history: Vec<(Uuid, Uuid, OffsetDateTime)>,
}

#[derive(Default)]
pub struct InMemoryUserStore {
    inner: Mutex<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }

    pub fn subscribe(&self, subscriber: Uuid, channel: Uuid) {
        self.inner.lock().unwrap().subscriptions.push((subscriber, channel));
    }

    pub fn add_video(&self, owner_id: Option<Uuid>, title: &str) -> Uuid {
        let id = Uuid::new_v4();
        let video = StoredVideo {
            id,
            owner_id,
            title: title.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.inner.lock().unwrap().videos.insert(id, video);
        id
    }

    pub fn record_watch(&self, user_id: Uuid, video_id: Uuid, watched_at: OffsetDateTime) {
        self.inner.lock().unwrap().history.push((user_id, video_id, watched_at));
    }

    fn update_with<F>(&self, id: Uuid, f: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut inner = self.inner.lock().unwrap();
        let user = inner.users.get_mut(&id)?;
        f(user);
        user.updated_at = OffsetDateTime::now_utc();
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| username == Some(u.username.as_str()) || email == Some(u.email.as_str()))
            .cloned())
    }

    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .users
            .values()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(AppError::Conflict("User with email or username already exists".into()));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            full_name: new.full_name,
            avatar_url: new.avatar_url,
            cover_image_url: new.cover_image_url,
            password_hash: new.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        self.update_with(id, |u| u.password_hash = password_hash.to_string());
        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> AppResult<()> {
        if let Some(user) = self.inner.lock().unwrap().users.get_mut(&id) {
            user.refresh_token = token.map(str::to_string);
        }
        Ok(())
    }

    async fn rotate_refresh_token(&self, id: Uuid, current: &str, next: &str) -> AppResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.users.get_mut(&id) {
            Some(user) if user.refresh_token.as_deref() == Some(current) => {
                user.refresh_token = Some(next.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_account(&self, id: Uuid, full_name: &str, email: &str) -> AppResult<Option<User>> {
        {
            let inner = self.inner.lock().unwrap();
            if inner.users.values().any(|u| u.id != id && u.email == email) {
                return Err(AppError::Conflict("User with email or username already exists".into()));
            }
        }
        Ok(self.update_with(id, |u| {
            u.full_name = full_name.to_string();
            u.email = email.to_string();
        }))
    }

    async fn update_avatar(&self, id: Uuid, avatar_url: &str) -> AppResult<Option<User>> {
        Ok(self.update_with(id, |u| u.avatar_url = avatar_url.to_string()))
    }

    async fn update_cover_image(&self, id: Uuid, cover_image_url: &str) -> AppResult<Option<User>> {
        Ok(self.update_with(id, |u| u.cover_image_url = Some(cover_image_url.to_string())))
    }

    async fn channel_profile(&self, username: &str, viewer: Uuid) -> AppResult<Option<ChannelProfile>> {
        let inner = self.inner.lock().unwrap();
        let Some(user) = inner.users.values().find(|u| u.username == username) else {
            return Ok(None);
        };
        let subscribers = inner.subscriptions.iter().filter(|(_, c)| *c == user.id);
        let subscribers_count = subscribers.clone().count() as i64;
        let is_subscribed = subscribers.clone().any(|(s, _)| *s == viewer);
        let channels_subscribed_to_count =
            inner.subscriptions.iter().filter(|(s, _)| *s == user.id).count() as i64;

        Ok(Some(ChannelProfile {
            id: user.id,
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            cover_image_url: user.cover_image_url.clone(),
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
        }))
    }

    async fn watch_history(&self, user_id: Uuid) -> AppResult<Vec<WatchedVideo>> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<_> = inner
            .history
            .iter()
            .filter(|(u, _, _)| *u == user_id)
            .filter_map(|(_, v, at)| inner.videos.get(v).map(|video| (video, *at)))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(entries
            .into_iter()
            .map(|(video, watched_at)| WatchedVideo {
                id: video.id,
                title: video.title.clone(),
                description: String::new(),
                video_file: format!("https://media.test/{}.mp4", video.id),
                thumbnail: format!("https://media.test/{}.jpg", video.id),
                duration: 0.0,
                views: 0,
                created_at: video.created_at,
                watched_at,
                owner: video
                    .owner_id
                    .and_then(|o| inner.users.get(&o))
                    .map(|o| VideoOwner {
                        full_name: o.full_name.clone(),
                        username: o.username.clone(),
                        avatar: o.avatar_url.clone(),
                    }),
            })
            .collect())
    }
}
