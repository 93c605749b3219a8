//! Post storage: boards, posts, per-post counters, like/bookmark toggles.
//!
//! Posts are soft-deleted; every read filters `is_deleted`. A post and its
//! `post_meta` counter row are created in one transaction.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

/// A discussion board.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
    pub description: String,
}

/// A post as it appears in listings, joined with author and counters.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category_id: i64,
    pub created_at: String,
    pub author_nickname: String,
    pub author_image_url: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub comments_count: i64,
}

/// A single post with everything the detail view needs except comments.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: i64,
    pub account_id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub author_nickname: String,
    pub author_image_url: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub comments_count: i64,
}

/// One page of a listing.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            items,
            total,
            current_page: page,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// Per-account contribution counts.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActivitySummary {
    pub posts: i64,
    pub comments: i64,
    pub likes: i64,
}

const SELECT_SUMMARY: &str = "SELECT p.id, p.title, p.content, p.category_id, p.created_at, \
     pr.nickname AS author_nickname, pr.image_url AS author_image_url, \
     m.views, m.likes, m.comments_count \
     FROM posts p \
     JOIN profiles pr ON pr.account_id = p.account_id \
     JOIN post_meta m ON m.post_id = p.id";

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all discussion boards.
    pub async fn categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as("SELECT id, name, abbreviation, description FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn category_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Create a post together with its counter row. Returns the post id.
    pub async fn create(
        &self,
        account_id: i64,
        category_id: i64,
        title: &str,
        content: &str,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO posts (account_id, category_id, title, content) VALUES (?, ?, ?, ?)",
        )
        .bind(account_id)
        .bind(category_id)
        .bind(title)
        .bind(content)
        .execute(&mut *tx)
        .await?;
        let post_id = result.last_insert_rowid();

        sqlx::query("INSERT INTO post_meta (post_id) VALUES (?)")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(post_id)
    }

    /// Partially update an owned, non-deleted post.
    pub async fn update(
        &self,
        account_id: i64,
        post_id: i64,
        title: Option<&str>,
        content: Option<&str>,
        category_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET \
                title = COALESCE(?, title), \
                content = COALESCE(?, content), \
                category_id = COALESCE(?, category_id), \
                updated_at = datetime('now') \
             WHERE id = ? AND account_id = ? AND is_deleted = 0",
        )
        .bind(title)
        .bind(content)
        .bind(category_id)
        .bind(post_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete an owned post.
    pub async fn soft_delete(&self, account_id: i64, post_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET is_deleted = 1, updated_at = datetime('now') \
             WHERE id = ? AND account_id = ? AND is_deleted = 0",
        )
        .bind(post_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest-first listing, optionally filtered by board.
    pub async fn list(
        &self,
        page: i64,
        limit: i64,
        category_id: Option<i64>,
    ) -> Result<Page<PostSummary>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let (items, total) = if let Some(category) = category_id {
            let items: Vec<PostSummary> = sqlx::query_as(&format!(
                "{} WHERE p.is_deleted = 0 AND p.category_id = ? \
                 ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
                SELECT_SUMMARY
            ))
            .bind(category)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
            let total: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM posts WHERE is_deleted = 0 AND category_id = ?",
            )
            .bind(category)
            .fetch_one(&self.pool)
            .await?;
            (items, total.0)
        } else {
            let items: Vec<PostSummary> = sqlx::query_as(&format!(
                "{} WHERE p.is_deleted = 0 \
                 ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
                SELECT_SUMMARY
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
            let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE is_deleted = 0")
                .fetch_one(&self.pool)
                .await?;
            (items, total.0)
        };

        Ok(Page::new(items, total, page, limit))
    }

    /// Newest-first listing of one account's posts.
    pub async fn list_by_account(
        &self,
        account_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<Page<PostSummary>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let items: Vec<PostSummary> = sqlx::query_as(&format!(
            "{} WHERE p.is_deleted = 0 AND p.account_id = ? \
             ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
            SELECT_SUMMARY
        ))
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM posts WHERE is_deleted = 0 AND account_id = ?")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(Page::new(items, total.0, page, limit))
    }

    /// Detail view of a non-deleted post (comments fetched separately).
    pub async fn get_detail(&self, post_id: i64) -> Result<Option<PostDetail>, sqlx::Error> {
        sqlx::query_as(
            "SELECT p.id, p.account_id, p.category_id, c.name AS category_name, \
                p.title, p.content, p.created_at, p.updated_at, \
                pr.nickname AS author_nickname, pr.image_url AS author_image_url, \
                m.views, m.likes, m.comments_count \
             FROM posts p \
             JOIN categories c ON c.id = p.category_id \
             JOIN profiles pr ON pr.account_id = p.account_id \
             JOIN post_meta m ON m.post_id = p.id \
             WHERE p.id = ? AND p.is_deleted = 0",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Bump the view counter.
    pub async fn increment_views(&self, post_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE post_meta SET views = views + 1 WHERE post_id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Toggle a like. Returns the new state, or None when the post does not
    /// exist (or is deleted).
    pub async fn toggle_like(
        &self,
        account_id: i64,
        post_id: i64,
    ) -> Result<Option<bool>, sqlx::Error> {
        self.toggle_flag(account_id, post_id, "post_likes", true).await
    }

    /// Toggle a bookmark. Returns the new state, or None when the post does
    /// not exist (or is deleted).
    pub async fn toggle_bookmark(
        &self,
        account_id: i64,
        post_id: i64,
    ) -> Result<Option<bool>, sqlx::Error> {
        self.toggle_flag(account_id, post_id, "post_bookmarks", false).await
    }

    async fn toggle_flag(
        &self,
        account_id: i64,
        post_id: i64,
        table: &str,
        counts_in_meta: bool,
    ) -> Result<Option<bool>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM posts WHERE id = ? AND is_deleted = 0")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            tx.rollback().await.ok();
            return Ok(None);
        }

        let current: Option<(bool,)> = sqlx::query_as(&format!(
            "SELECT is_active FROM {} WHERE account_id = ? AND post_id = ?",
            table
        ))
        .bind(account_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        let new_state = !current.map(|(active,)| active).unwrap_or(false);

        sqlx::query(&format!(
            "INSERT INTO {} (account_id, post_id, is_active) VALUES (?, ?, ?) \
             ON CONFLICT(account_id, post_id) DO UPDATE SET is_active = excluded.is_active",
            table
        ))
        .bind(account_id)
        .bind(post_id)
        .bind(new_state)
        .execute(&mut *tx)
        .await?;

        if counts_in_meta {
            let delta = if new_state { 1 } else { -1 };
            sqlx::query("UPDATE post_meta SET likes = likes + ? WHERE post_id = ?")
                .bind(delta)
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(new_state))
    }

    /// Newest-first page of an account's active bookmarks.
    pub async fn bookmarks(
        &self,
        account_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<Page<PostSummary>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let items: Vec<PostSummary> = sqlx::query_as(
            "SELECT p.id, p.title, p.content, p.category_id, p.created_at, \
                pr.nickname AS author_nickname, pr.image_url AS author_image_url, \
                m.views, m.likes, m.comments_count \
             FROM post_bookmarks b \
             JOIN posts p ON p.id = b.post_id AND p.is_deleted = 0 \
             JOIN profiles pr ON pr.account_id = p.account_id \
             JOIN post_meta m ON m.post_id = p.id \
             WHERE b.account_id = ? AND b.is_active = 1 \
             ORDER BY b.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        )
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM post_bookmarks b \
             JOIN posts p ON p.id = b.post_id AND p.is_deleted = 0 \
             WHERE b.account_id = ? AND b.is_active = 1",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(items, total.0, page, limit))
    }

    /// Contribution counts for an account.
    pub async fn activity(&self, account_id: i64) -> Result<ActivitySummary, sqlx::Error> {
        let posts: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM posts WHERE account_id = ? AND is_deleted = 0")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;
        let comments: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;
        let likes: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM post_likes WHERE account_id = ? AND is_active = 1",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ActivitySummary {
            posts: posts.0,
            comments: comments.0,
            likes: likes.0,
        })
    }
}
