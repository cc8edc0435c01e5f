use crate::{
    models::{owner_columns, NewComment, SqlComment},
    Db,
};
use chrono::NaiveDateTime;
use domain::{Author, Comment, CommentId, CommentStatus, PageResource};
use tracing::debug;

impl Db {
    /// Inserts a comment and returns its id.
    ///
    /// A reply is only written if its parent is an active top-level comment
    /// on the same page at the moment of the insert; otherwise nothing is
    /// written and `None` comes back.
    pub async fn insert_comment(&self, c: &NewComment<'_>) -> anyhow::Result<Option<CommentId>> {
        let (kind, user_id, fingerprint) = owner_columns(c.author);

        let result = sqlx::query(
            r#"
            INSERT INTO comments (
                parent_id, author_kind, user_id, guest_fingerprint,
                author_name, page_resource, pos_x, pos_y,
                body, status, created_at, updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?11, ?10, ?10
            WHERE ?1 = 0 OR EXISTS (
                SELECT 1 FROM comments p
                WHERE p.id = ?1
                  AND p.parent_id = 0
                  AND p.status = 'active'
                  AND p.page_resource = ?6
            )
            "#,
        )
        .bind(c.parent_id)
        .bind(kind)
        .bind(user_id)
        .bind(fingerprint)
        .bind(c.author_name)
        .bind(c.page.as_str())
        .bind(&c.position.x)
        .bind(&c.position.y)
        .bind(c.body)
        .bind(c.now)
        .bind(CommentStatus::Active.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(result.last_insert_rowid()))
    }

    /// Active comment by id.
    pub async fn get_comment(&self, id: CommentId) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                id, parent_id, author_kind, user_id, guest_fingerprint,
                author_name, page_resource, pos_x, pos_y,
                body, status, created_at, updated_at
            FROM comments
            WHERE id = ? AND status = 'active'
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Comment::try_from).transpose()
    }

    /// Active comments of a page, top-level ones first.
    ///
    /// The ordering does not nest replies under their parents; callers group
    /// them by `parent_id`.
    pub async fn list_comments(&self, page: &PageResource) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                id, parent_id, author_kind, user_id, guest_fingerprint,
                author_name, page_resource, pos_x, pos_y,
                body, status, created_at, updated_at
            FROM comments
            WHERE page_resource = ? AND status = 'active'
            ORDER BY parent_id ASC, created_at ASC, id ASC
            "#,
        )
        .bind(page.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    /// Replaces the body of `id` if it is active and written by `owner`.
    /// Returns the number of rows changed (0 or 1).
    pub async fn update_comment_body(
        &self,
        id: CommentId,
        owner: &Author,
        body: &str,
        now: NaiveDateTime,
    ) -> anyhow::Result<u64> {
        let (kind, user_id, fingerprint) = owner_columns(owner);

        let result = sqlx::query(
            r#"
            UPDATE comments
            SET body = ?, updated_at = ?
            WHERE id = ?
              AND status = 'active'
              AND author_kind = ?
              AND user_id IS ?
              AND guest_fingerprint IS ?
            "#,
        )
        .bind(body)
        .bind(now)
        .bind(id)
        .bind(kind)
        .bind(user_id)
        .bind(fingerprint)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Soft-deletes `id` and its replies if `id` is active and written by
    /// `owner`. Returns the number of comments marked deleted, 0 when the
    /// ownership condition fails.
    pub async fn delete_thread(
        &self,
        id: CommentId,
        owner: &Author,
        now: NaiveDateTime,
    ) -> anyhow::Result<u64> {
        let (kind, user_id, fingerprint) = owner_columns(owner);
        let mut tx = self.pool.begin().await?;

        let parent = sqlx::query(
            r#"
            UPDATE comments
            SET status = ?, updated_at = ?
            WHERE id = ?
              AND status = 'active'
              AND author_kind = ?
              AND user_id IS ?
              AND guest_fingerprint IS ?
            "#,
        )
        .bind(CommentStatus::Deleted.as_str())
        .bind(now)
        .bind(id)
        .bind(kind)
        .bind(user_id)
        .bind(fingerprint)
        .execute(&mut *tx)
        .await?;

        if parent.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        // 只有一层回复，直接子评论即整个线程
        let replies = sqlx::query(
            r#"
            UPDATE comments
            SET status = ?, updated_at = ?
            WHERE parent_id = ? AND status = 'active'
            "#,
        )
        .bind(CommentStatus::Deleted.as_str())
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(
            "Deleted comment {} with {} replies",
            id,
            replies.rows_affected()
        );
        Ok(parent.rows_affected() + replies.rows_affected())
    }
}
