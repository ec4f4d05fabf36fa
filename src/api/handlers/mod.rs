/// Health, registration and login.
pub mod auth;
/// Posts, feed and likes.
pub mod posts;
/// Profiles, follow relations and password changes.
pub mod users;
