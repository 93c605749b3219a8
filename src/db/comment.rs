//! Comment storage. Creation and deletion keep `post_meta.comments_count`
//! in step inside one transaction.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct CommentStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub account_id: i64,
    pub parent_comment_id: Option<i64>,
    pub content: String,
    pub created_at: String,
    pub author_nickname: String,
    pub author_image_url: Option<String>,
}

impl CommentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a comment to a non-deleted post. Returns the comment id, or None
    /// when the post (or the named parent comment) does not exist.
    pub async fn create(
        &self,
        post_id: i64,
        account_id: i64,
        parent_comment_id: Option<i64>,
        content: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let post: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM posts WHERE id = ? AND is_deleted = 0")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if post.is_none() {
            tx.rollback().await.ok();
            return Ok(None);
        }

        if let Some(parent) = parent_comment_id {
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM comments WHERE id = ? AND post_id = ?")
                    .bind(parent)
                    .bind(post_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if exists.is_none() {
                tx.rollback().await.ok();
                return Ok(None);
            }
        }

        let result = sqlx::query(
            "INSERT INTO comments (post_id, account_id, parent_comment_id, content) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(post_id)
        .bind(account_id)
        .bind(parent_comment_id)
        .bind(content)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE post_meta SET comments_count = comments_count + 1 WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(result.last_insert_rowid()))
    }

    /// All comments on a post, newest first, with author profile joined.
    pub async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>, sqlx::Error> {
        sqlx::query_as(
            "SELECT c.id, c.post_id, c.account_id, c.parent_comment_id, c.content, c.created_at, \
                pr.nickname AS author_nickname, pr.image_url AS author_image_url \
             FROM comments c \
             JOIN profiles pr ON pr.account_id = c.account_id \
             WHERE c.post_id = ? \
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Delete an owned comment and its direct replies.
    pub async fn delete(&self, account_id: i64, comment_id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<(i64,)> = sqlx::query_as(
            "SELECT post_id FROM comments WHERE id = ? AND account_id = ?",
        )
        .bind(comment_id)
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((post_id,)) = owned else {
            tx.rollback().await.ok();
            return Ok(false);
        };

        let replies = sqlx::query("DELETE FROM comments WHERE parent_comment_id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        let removed = replies as i64 + 1;
        sqlx::query(
            "UPDATE post_meta SET comments_count = MAX(comments_count - ?, 0) WHERE post_id = ?",
        )
        .bind(removed)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
