//! Persistence for users, follow relations and posts.
//!
//! [`traits`] defines the contracts the rest of the crate depends on;
//! [`sqlite`] is the libsql-backed implementation used by the server.

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteClient;
pub use traits::{CredentialStore, PostRepository, ResourceOwners, StoredCredential, UserRepository};
