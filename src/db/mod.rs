mod account;
mod comment;
mod personality;
mod pet;
mod post;
mod session;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use account::{Account, AccountStore, NewAccount, Origin, ResolveError, Role};
pub use comment::{Comment, CommentStore};
pub use personality::{PersonalityResult, PersonalityResultStore};
pub use pet::{Pet, PetStore};
pub use post::{ActivitySummary, Category, Page, PostDetail, PostStore, PostSummary};
pub use session::{Session, SessionStore, generate_token, unix_now};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        // An in-memory database exists per connection, so the pool must
        // not open a second one.
        let max_connections = if path == ":memory:" { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                // Accounts table. One row per (email, origin) pair, so a
                // native account and a federated account can coexist for
                // the same person.
                "CREATE TABLE accounts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT NOT NULL,
                    origin TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'user',
                    gender TEXT,
                    age_range TEXT,
                    birthday TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    UNIQUE (email, origin)
                )",
                "CREATE INDEX idx_accounts_email ON accounts(email)",
                // Profiles table, 1:1 with accounts.
                "CREATE TABLE profiles (
                    account_id INTEGER PRIMARY KEY REFERENCES accounts(id) ON DELETE CASCADE,
                    nickname TEXT NOT NULL,
                    image_url TEXT
                )",
                // Refresh sessions, one row per (account, device).
                // Timestamps are integer unix seconds so liveness is a
                // strict `expires_at > now` comparison.
                "CREATE TABLE sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    token TEXT UNIQUE NOT NULL,
                    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                    device TEXT NOT NULL DEFAULT 'unknown',
                    expires_at INTEGER NOT NULL,
                    created_at INTEGER NOT NULL
                )",
                "CREATE INDEX idx_sessions_account_id ON sessions(account_id)",
                "CREATE INDEX idx_sessions_expires_at ON sessions(expires_at)",
                // Pets table.
                "CREATE TABLE pets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    breed TEXT,
                    age INTEGER,
                    birth TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_pets_account_id ON pets(account_id)",
                // Discussion boards.
                "CREATE TABLE categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    abbreviation TEXT NOT NULL,
                    description TEXT NOT NULL
                )",
                // Posts with soft delete; listing always filters is_deleted.
                "CREATE TABLE posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                    category_id INTEGER NOT NULL REFERENCES categories(id),
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    is_deleted INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_posts_account_id ON posts(account_id)",
                "CREATE INDEX idx_posts_category_id ON posts(category_id)",
                "CREATE INDEX idx_posts_created_at ON posts(created_at)",
                // Per-post counters, created together with the post.
                "CREATE TABLE post_meta (
                    post_id INTEGER PRIMARY KEY REFERENCES posts(id) ON DELETE CASCADE,
                    views INTEGER NOT NULL DEFAULT 0,
                    likes INTEGER NOT NULL DEFAULT 0,
                    comments_count INTEGER NOT NULL DEFAULT 0
                )",
                // Comments, optionally nested one level via parent_comment_id.
                "CREATE TABLE comments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                    parent_comment_id INTEGER REFERENCES comments(id),
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_comments_post_id ON comments(post_id)",
                "CREATE INDEX idx_comments_account_id ON comments(account_id)",
                // Like/bookmark toggles keep their row and flip is_active.
                "CREATE TABLE post_likes (
                    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                    post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (account_id, post_id)
                )",
                "CREATE TABLE post_bookmarks (
                    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                    post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (account_id, post_id)
                )",
                "CREATE INDEX idx_post_bookmarks_created_at ON post_bookmarks(created_at)",
                // Personality test results, one per submission.
                "CREATE TABLE personality_results (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                    pet_id INTEGER NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
                    type TEXT NOT NULL,
                    introversion_extroversion INTEGER NOT NULL,
                    dependence_leadership INTEGER NOT NULL,
                    rationality_emotionality INTEGER NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_personality_results_account_id ON personality_results(account_id)",
                // Seed the discussion boards.
                "INSERT INTO categories (name, abbreviation, description) VALUES
                    ('Free Board', 'free', 'Talk about anything.'),
                    ('Local Board', 'local', 'News from your neighborhood.'),
                    ('Gear Reviews', 'gear', 'Which pet products have you tried?'),
                    ('Adoption Stories', 'adoption', 'Adopted a rescue? Share your story.'),
                    ('Tips & Info', 'info', 'Share tips and know-how.')",
            ],
        )
        .await
    }

    /// Get the account store.
    pub fn accounts(&self) -> AccountStore {
        AccountStore::new(self.pool.clone())
    }

    /// Get the session store.
    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.pool.clone())
    }

    /// Get the pet store.
    pub fn pets(&self) -> PetStore {
        PetStore::new(self.pool.clone())
    }

    /// Get the post store.
    pub fn posts(&self) -> PostStore {
        PostStore::new(self.pool.clone())
    }

    /// Get the comment store.
    pub fn comments(&self) -> CommentStore {
        CommentStore::new(self.pool.clone())
    }

    /// Get the personality-result store.
    pub fn personality_results(&self) -> PersonalityResultStore {
        PersonalityResultStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a new transaction.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }
}
