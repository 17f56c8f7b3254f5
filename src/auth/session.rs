//! Login, refresh-token rotation, logout and password change.

use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::claims::Identity;
use super::jwt::{JwtKeys, TokenError, TokenPair};
use super::password::{set_password, verify_user_password};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users::{
        repo_types::{PublicUser, User},
        store::UserStore,
    },
};

/// Username and/or email a login is attempted with; either may match.
#[derive(Debug, Clone, Default)]
pub struct LoginIdentity {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[cfg(test)]
impl LoginIdentity {
    /// Treats `value` as either a username or an email.
    pub fn any(value: &str) -> Self {
        let value = value.trim().to_lowercase();
        Self {
            username: Some(value.clone()),
            email: Some(value),
        }
    }
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

pub struct SessionManager {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        SessionManager::new(state.users.clone(), JwtKeys::from_ref(state))
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    pub async fn find_by_identity(&self, identity: &LoginIdentity) -> AppResult<Option<User>> {
        self.store
            .find_by_username_or_email(identity.username.as_deref(), identity.email.as_deref())
            .await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, identity: &LoginIdentity, password: &str) -> AppResult<LoginOutcome> {
        let user = self
            .find_by_identity(identity)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;

        if !verify_user_password(&user, password)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::InvalidCredentials("Invalid user credentials".into()));
        }

        let tokens = self.issue(&user)?;
        self.store
            .set_refresh_token(user.id, Some(&tokens.refresh_token))
            .await?;

        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome {
            user: PublicUser::from(user),
            tokens,
        })
    }

    #[instrument(skip_all)]
    pub async fn refresh(&self, presented: Option<&str>) -> AppResult<TokenPair> {
        let presented = presented
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Unauthorized("Unauthorized request".into()))?;

        let claims = self.keys.verify_refresh(presented).map_err(|e| {
            warn!(error = %e, "refresh token rejected");
            AppError::Unauthorized("Invalid refresh token".into())
        })?;

        let user = self
            .store
            .find_by_id(claims.id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

        if user.refresh_token.as_deref() != Some(presented) {
            warn!(user_id = %user.id, "superseded refresh token presented");
            return Err(AppError::Unauthorized("Refresh token is expired or used".into()));
        }

        let tokens = self.issue(&user)?;
        let rotated = self
            .store
            .rotate_refresh_token(user.id, presented, &tokens.refresh_token)
            .await?;
        if !rotated {
            warn!(user_id = %user.id, "refresh token rotated concurrently");
            return Err(AppError::Unauthorized("Refresh token is expired or used".into()));
        }

        info!(user_id = %user.id, "access token refreshed");
        Ok(tokens)
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: Uuid) -> AppResult<()> {
        self.store.set_refresh_token(user_id, None).await?;
        info!(%user_id, "user logged out");
        Ok(())
    }

    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;

        if !verify_user_password(&user, old_password)? {
            return Err(AppError::InvalidCredentials("Invalid password".into()));
        }

        set_password(self.store.as_ref(), user.id, new_password).await?;
        info!(%user_id, "password changed");
        Ok(())
    }

    fn issue(&self, user: &User) -> AppResult<TokenPair> {
        self.keys
            .issue_pair(&Identity::from(user))
            .map_err(|e: TokenError| {
                tracing::error!(error = %e, user_id = %user.id, "token issuance failed");
                AppError::Internal(
                    "Something went wrong while generating access and refresh tokens".into(),
                )
            })
    }
}
