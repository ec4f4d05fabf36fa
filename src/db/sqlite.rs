use crate::db::traits::{
    CredentialStore, PostRepository, ResourceOwners, StoredCredential, UserRepository,
};
use crate::types::{AppError, Post, PostDraft, PostId, Result, User, UserId, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row, Rows};
use std::path::Path;

const USER_COLUMNS: &str = "u.id, u.name, u.nick, u.email, u.created_at";
const POST_COLUMNS: &str = "p.id, p.title, p.content, p.author_id, u.nick, p.likes, p.created_at";

/// libsql-backed store for users, follows and posts.
///
/// Holds a single connection so that `:memory:` databases are shared by
/// every caller.
pub struct SqliteClient {
    _db: Database,
    conn: Connection,
}

fn row_err(e: libsql::Error) -> AppError {
    AppError::Database(e.to_string())
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn user_from_row(row: &Row) -> Result<User> {
    Ok(User {
        id: row.get(0).map_err(row_err)?,
        name: row.get(1).map_err(row_err)?,
        nick: row.get(2).map_err(row_err)?,
        email: row.get(3).map_err(row_err)?,
        created_at: timestamp(row.get::<i64>(4).map_err(row_err)?),
    })
}

fn post_from_row(row: &Row) -> Result<Post> {
    Ok(Post {
        id: row.get(0).map_err(row_err)?,
        title: row.get(1).map_err(row_err)?,
        content: row.get(2).map_err(row_err)?,
        author_id: row.get(3).map_err(row_err)?,
        author_nick: row.get(4).map_err(row_err)?,
        likes: row.get(5).map_err(row_err)?,
        created_at: timestamp(row.get::<i64>(6).map_err(row_err)?),
    })
}

async fn collect<T>(mut rows: Rows, map: fn(&Row) -> Result<T>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next().await.map_err(row_err)? {
        items.push(map(&row)?);
    }
    Ok(items)
}

impl SqliteClient {
    /// Opens (or creates) a local database file and bootstraps the schema.
    pub async fn new_local(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::Database(format!("Failed to create database directory: {}", e))
                    })?;
                }
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self { _db: db, conn };
        client.initialize_schema().await?;

        tracing::info!(path, "database ready");
        Ok(client)
    }

    /// Ephemeral database, used by tests and `database.url = ":memory:"`.
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to enable foreign keys: {}", e)))?;

        // Users table
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    nick TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        // Follow relations
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS followers (
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    follower_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    PRIMARY KEY (user_id, follower_id)
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create followers table: {}", e)))?;

        // Posts table
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    likes INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create posts table: {}", e)))?;

        Ok(())
    }

    async fn identity_taken(&self, profile: &UserProfile, except: Option<UserId>) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM users WHERE (email = ? OR nick = ?) AND id != ?",
                (
                    profile.email.as_str(),
                    profile.nick.as_str(),
                    except.unwrap_or(-1),
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to check user identity: {}", e)))?;

        Ok(rows.next().await.map_err(row_err)?.is_some())
    }

    async fn query_users(&self, sql: &str, user_id: UserId) -> Result<Vec<User>> {
        let rows = self
            .conn
            .query(sql, [user_id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query users: {}", e)))?;

        collect(rows, user_from_row).await
    }
}

// ============== Capabilities ==============

#[async_trait]
impl CredentialStore for SqliteClient {
    async fn credential_by_email(&self, email: &str) -> Result<Option<StoredCredential>> {
        let mut rows = self
            .conn
            .query("SELECT id, password_hash FROM users WHERE email = ?", [email])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query credential: {}", e)))?;

        match rows.next().await.map_err(row_err)? {
            Some(row) => Ok(Some(StoredCredential {
                user_id: row.get(0).map_err(row_err)?,
                password_hash: row.get(1).map_err(row_err)?,
            })),
            None => Ok(None),
        }
    }

    async fn credential(&self, user_id: UserId) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT password_hash FROM users WHERE id = ?", [user_id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query credential: {}", e)))?;

        match rows.next().await.map_err(row_err)? {
            Some(row) => Ok(Some(row.get(0).map_err(row_err)?)),
            None => Ok(None),
        }
    }

    async fn set_credential(&self, user_id: UserId, password_hash: &str) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE users SET password_hash = ? WHERE id = ?",
                (password_hash, user_id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update credential: {}", e)))?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceOwners for SqliteClient {
    async fn post_owner(&self, post_id: PostId) -> Result<Option<UserId>> {
        let mut rows = self
            .conn
            .query("SELECT author_id FROM posts WHERE id = ?", [post_id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query post owner: {}", e)))?;

        match rows.next().await.map_err(row_err)? {
            Some(row) => Ok(Some(row.get(0).map_err(row_err)?)),
            None => Ok(None),
        }
    }
}

// ============== Users ==============

#[async_trait]
impl UserRepository for SqliteClient {
    async fn create_user(&self, profile: &UserProfile, password_hash: &str) -> Result<User> {
        if self.identity_taken(profile, None).await? {
            return Err(AppError::Conflict(
                "A user with this email or nick already exists".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        let mut rows = self
            .conn
            .query(
                "INSERT INTO users (name, nick, email, password_hash, created_at)
                 VALUES (?, ?, ?, ?, ?) RETURNING id",
                (
                    profile.name.as_str(),
                    profile.nick.as_str(),
                    profile.email.as_str(),
                    password_hash,
                    now,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create user: {}", e)))?;

        let row = rows
            .next()
            .await
            .map_err(row_err)?
            .ok_or_else(|| AppError::Database("Insert returned no id".to_string()))?;

        Ok(User {
            id: row.get(0).map_err(row_err)?,
            name: profile.name.clone(),
            nick: profile.nick.clone(),
            email: profile.email.clone(),
            created_at: timestamp(now),
        })
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS);
        Ok(self.query_users(&sql, id).await?.into_iter().next())
    }

    async fn list_users(&self, filter: Option<&str>) -> Result<Vec<User>> {
        let rows = match filter.map(str::trim).filter(|f| !f.is_empty()) {
            Some(filter) => {
                let pattern = format!("%{}%", filter.to_lowercase());
                self.conn
                    .query(
                        &format!(
                            "SELECT {} FROM users u
                             WHERE lower(u.name) LIKE ? OR lower(u.nick) LIKE ?
                             ORDER BY u.id",
                            USER_COLUMNS
                        ),
                        (pattern.as_str(), pattern.as_str()),
                    )
                    .await
            }
            None => {
                self.conn
                    .query(
                        &format!("SELECT {} FROM users u ORDER BY u.id", USER_COLUMNS),
                        (),
                    )
                    .await
            }
        }
        .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?;

        collect(rows, user_from_row).await
    }

    async fn update_user(&self, id: UserId, profile: &UserProfile) -> Result<()> {
        if self.identity_taken(profile, Some(id)).await? {
            return Err(AppError::Conflict(
                "A user with this email or nick already exists".to_string(),
            ));
        }

        let changed = self
            .conn
            .execute(
                "UPDATE users SET name = ?, nick = ?, email = ? WHERE id = ?",
                (
                    profile.name.as_str(),
                    profile.nick.as_str(),
                    profile.email.as_str(),
                    id,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn follow(&self, user_id: UserId, follower_id: UserId) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO followers (user_id, follower_id) VALUES (?, ?)
                 ON CONFLICT DO NOTHING",
                (user_id, follower_id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to follow user: {}", e)))?;

        Ok(())
    }

    async fn unfollow(&self, user_id: UserId, follower_id: UserId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM followers WHERE user_id = ? AND follower_id = ?",
                (user_id, follower_id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to unfollow user: {}", e)))?;

        Ok(())
    }

    async fn followers(&self, user_id: UserId) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users u
             INNER JOIN followers f ON u.id = f.follower_id
             WHERE f.user_id = ? ORDER BY u.id",
            USER_COLUMNS
        );
        self.query_users(&sql, user_id).await
    }

    async fn following(&self, user_id: UserId) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users u
             INNER JOIN followers f ON u.id = f.user_id
             WHERE f.follower_id = ? ORDER BY u.id",
            USER_COLUMNS
        );
        self.query_users(&sql, user_id).await
    }
}

// ============== Posts ==============

#[async_trait]
impl PostRepository for SqliteClient {
    async fn create_post(&self, author_id: UserId, draft: &PostDraft) -> Result<Post> {
        let now = Utc::now().timestamp();
        let mut rows = self
            .conn
            .query(
                "INSERT INTO posts (title, content, author_id, likes, created_at)
                 VALUES (?, ?, ?, 0, ?) RETURNING id",
                (draft.title.as_str(), draft.content.as_str(), author_id, now),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create post: {}", e)))?;

        let id: PostId = rows
            .next()
            .await
            .map_err(row_err)?
            .ok_or_else(|| AppError::Database("Insert returned no id".to_string()))?
            .get(0)
            .map_err(row_err)?;
        drop(rows);

        self.get_post(id)
            .await?
            .ok_or_else(|| AppError::Database(format!("Post {} vanished after insert", id)))
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {} FROM posts p
                     INNER JOIN users u ON u.id = p.author_id
                     WHERE p.id = ?",
                    POST_COLUMNS
                ),
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query post: {}", e)))?;

        Ok(collect(rows, post_from_row).await?.into_iter().next())
    }

    async fn feed(&self, user_id: UserId) -> Result<Vec<Post>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT DISTINCT {} FROM posts p
                     INNER JOIN users u ON u.id = p.author_id
                     LEFT JOIN followers f ON p.author_id = f.user_id
                     WHERE p.author_id = ? OR f.follower_id = ?
                     ORDER BY p.id DESC",
                    POST_COLUMNS
                ),
                (user_id, user_id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query feed: {}", e)))?;

        collect(rows, post_from_row).await
    }

    async fn posts_by_author(&self, author_id: UserId) -> Result<Vec<Post>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {} FROM posts p
                     INNER JOIN users u ON u.id = p.author_id
                     WHERE p.author_id = ?
                     ORDER BY p.id DESC",
                    POST_COLUMNS
                ),
                [author_id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query posts: {}", e)))?;

        collect(rows, post_from_row).await
    }

    async fn update_post(&self, id: PostId, draft: &PostDraft) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE posts SET title = ?, content = ? WHERE id = ?",
                (draft.title.as_str(), draft.content.as_str(), id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update post: {}", e)))?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("post {}", id)));
        }
        Ok(())
    }

    async fn delete_post(&self, id: PostId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete post: {}", e)))?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("post {}", id)));
        }
        Ok(())
    }

    async fn like(&self, id: PostId) -> Result<()> {
        let changed = self
            .conn
            .execute("UPDATE posts SET likes = likes + 1 WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to like post: {}", e)))?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("post {}", id)));
        }
        Ok(())
    }

    async fn unlike(&self, id: PostId) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE posts SET likes = CASE WHEN likes > 0 THEN likes - 1 ELSE 0 END
                 WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to unlike post: {}", e)))?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("post {}", id)));
        }
        Ok(())
    }
}
