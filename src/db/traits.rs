//! Persistence contracts
//!
//! The auth core only needs two narrow capabilities: reading and replacing a
//! user's stored credential ([`CredentialStore`]) and looking up who owns a
//! resource ([`ResourceOwners`]). The full repositories used by the HTTP
//! handlers extend those capabilities, so any backend implementing them is a
//! drop-in replacement.
//!
//! Implementations are assumed to be atomic per call; the caller never holds
//! a transaction.

use crate::types::{Post, PostDraft, PostId, Result, User, UserId, UserProfile};
use async_trait::async_trait;

/// A user's id together with their stored password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub user_id: UserId,
    pub password_hash: String,
}

/// Read and replace stored password hashes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Credential for the account registered under `email`
    async fn credential_by_email(&self, email: &str) -> Result<Option<StoredCredential>>;

    /// Stored hash for `user_id`
    async fn credential(&self, user_id: UserId) -> Result<Option<String>>;

    /// Replace the stored hash for `user_id`
    async fn set_credential(&self, user_id: UserId, password_hash: &str) -> Result<()>;
}

/// Ownership lookups for owned resources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceOwners: Send + Sync {
    /// Author of the post, or `None` when the post does not exist
    async fn post_owner(&self, post_id: PostId) -> Result<Option<UserId>>;
}

/// User and follow-relation storage.
#[async_trait]
pub trait UserRepository: CredentialStore {
    // ============== User Operations ==============

    /// Create a user. Fails with `Conflict` when the email or nick is taken.
    async fn create_user(&self, profile: &UserProfile, password_hash: &str) -> Result<User>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// All users, optionally filtered by a case-insensitive name/nick substring
    async fn list_users(&self, filter: Option<&str>) -> Result<Vec<User>>;

    /// Fails with `NotFound` for an unknown id, `Conflict` for a taken email/nick
    async fn update_user(&self, id: UserId, profile: &UserProfile) -> Result<()>;

    async fn delete_user(&self, id: UserId) -> Result<()>;

    // ============== Follow Operations ==============

    /// Idempotent
    async fn follow(&self, user_id: UserId, follower_id: UserId) -> Result<()>;

    async fn unfollow(&self, user_id: UserId, follower_id: UserId) -> Result<()>;

    /// Users following `user_id`
    async fn followers(&self, user_id: UserId) -> Result<Vec<User>>;

    /// Users that `user_id` follows
    async fn following(&self, user_id: UserId) -> Result<Vec<User>>;
}

/// Post and like storage.
#[async_trait]
pub trait PostRepository: ResourceOwners {
    async fn create_post(&self, author_id: UserId, draft: &PostDraft) -> Result<Post>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>>;

    /// Posts by `user_id` and by everyone `user_id` follows, newest first
    async fn feed(&self, user_id: UserId) -> Result<Vec<Post>>;

    async fn posts_by_author(&self, author_id: UserId) -> Result<Vec<Post>>;

    /// Fails with `NotFound` for an unknown id
    async fn update_post(&self, id: PostId, draft: &PostDraft) -> Result<()>;

    /// Fails with `NotFound` for an unknown id
    async fn delete_post(&self, id: PostId) -> Result<()>;

    /// Fails with `NotFound` for an unknown id
    async fn like(&self, id: PostId) -> Result<()>;

    /// Never takes the counter below zero. Fails with `NotFound` for an unknown id
    async fn unlike(&self, id: PostId) -> Result<()>;
}
