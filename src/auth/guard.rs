//! Authorization rules for mutating operations.
//!
//! Every check takes the [`Principal`] resolved by the authentication layer
//! and the identifier the request wants to act on. Checks run before any
//! state changes, so a rejected request leaves persistence untouched.

use crate::auth::jwt::Principal;
use crate::auth::password::PasswordHasher;
use crate::auth::AuthError;
use crate::db::traits::{CredentialStore, ResourceOwners};
use crate::types::{AppError, PostId, Result, UserId};
use std::sync::Arc;

pub struct AuthorizationGuard {
    credentials: Arc<dyn CredentialStore>,
    owners: Arc<dyn ResourceOwners>,
    hasher: PasswordHasher,
}

impl AuthorizationGuard {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        owners: Arc<dyn ResourceOwners>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            credentials,
            owners,
            hasher,
        }
    }

    /// Updating or deleting a user record is only allowed on oneself.
    pub fn authorize_user_mutation(
        &self,
        principal: &Principal,
        user_id: UserId,
    ) -> std::result::Result<(), AuthError> {
        if principal.user_id != user_id {
            tracing::warn!(
                principal = principal.user_id,
                target = user_id,
                "user mutation on another account rejected"
            );
            return Err(AuthError::OwnershipViolation);
        }
        Ok(())
    }

    /// Follow and unfollow must target somebody else.
    pub fn authorize_relationship(
        &self,
        principal: &Principal,
        target: UserId,
    ) -> std::result::Result<(), AuthError> {
        if principal.user_id == target {
            return Err(AuthError::SelfTargetViolation);
        }
        Ok(())
    }

    /// Only the author may update or delete a post.
    ///
    /// A missing post is `NotFound`, never an ownership error.
    pub async fn authorize_post_mutation(&self, principal: &Principal, post_id: PostId) -> Result<()> {
        let owner = self
            .owners
            .post_owner(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        if owner != principal.user_id {
            tracing::warn!(
                principal = principal.user_id,
                post_id,
                owner,
                "post mutation by non-author rejected"
            );
            return Err(AuthError::OwnershipViolation.into());
        }
        Ok(())
    }

    /// Checks that `principal` may replace the password of `user_id`.
    ///
    /// The self check runs first, so a foreign account's credential is never
    /// read. The current password must then verify against the stored hash.
    pub async fn authorize_password_change(
        &self,
        principal: &Principal,
        user_id: UserId,
        current: &str,
    ) -> Result<()> {
        self.authorize_user_mutation(principal, user_id)?;

        let stored = self
            .credentials
            .credential(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

        self.hasher
            .verify_blocking(stored, current.to_string())
            .await?;
        Ok(())
    }

    /// Replaces the password of `user_id` after [`authorize_password_change`](Self::authorize_password_change) passes.
    pub async fn change_password(
        &self,
        principal: &Principal,
        user_id: UserId,
        current: &str,
        new: &str,
    ) -> Result<()> {
        self.authorize_password_change(principal, user_id, current)
            .await?;

        let hash = self.hasher.hash_blocking(new.to_string()).await?;
        self.credentials.set_credential(user_id, &hash).await?;

        tracing::info!(user_id, "password changed");
        Ok(())
    }
}
