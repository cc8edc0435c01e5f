use crate::Db;
use domain::CommentStats;
use sqlx::Row;

impl Db {
    /// Counts over active comments across all pages.
    pub async fn comment_stats(&self) -> anyhow::Result<CommentStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN parent_id = 0 THEN 1 ELSE 0 END), 0) AS threads,
                COALESCE(SUM(CASE WHEN parent_id > 0 THEN 1 ELSE 0 END), 0) AS replies,
                COUNT(DISTINCT author_kind || ':' || COALESCE(CAST(user_id AS TEXT), guest_fingerprint)) AS authors
            FROM comments
            WHERE status = 'active'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CommentStats {
            threads: row.try_get("threads")?,
            replies: row.try_get("replies")?,
            authors: row.try_get("authors")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewComment;
    use domain::{Actor, PageResource, Position};

    #[tokio::test]
    async fn empty_database_has_zero_stats() {
        let db = Db::in_memory().await.unwrap();
        assert_eq!(db.comment_stats().await.unwrap(), CommentStats::default());
    }

    #[tokio::test]
    async fn counts_threads_replies_and_authors() {
        let db = Db::in_memory().await.unwrap();
        let page = PageResource::parse("https://site.example/").unwrap();
        let position = Position::new("1px", "1px").unwrap();
        let now = chrono::Utc::now().naive_utc();
        let alice = Actor::Authenticated { user_id: 1 }.author();
        let guest = Actor::Guest { token: "g".into() }.author();

        let mut ids = Vec::new();
        for (author, parent) in [(&alice, 0), (&guest, 0)] {
            let id = db
                .insert_comment(&NewComment {
                    parent_id: parent,
                    author,
                    author_name: "x",
                    page: &page,
                    position: &position,
                    body: "b",
                    now,
                })
                .await
                .unwrap()
                .unwrap();
            ids.push(id);
        }
        db.insert_comment(&NewComment {
            parent_id: ids[0],
            author: &guest,
            author_name: "x",
            page: &page,
            position: &position,
            body: "reply",
            now,
        })
        .await
        .unwrap()
        .unwrap();

        let stats = db.comment_stats().await.unwrap();
        assert_eq!(
            stats,
            CommentStats {
                threads: 2,
                replies: 1,
                authors: 2
            }
        );

        db.delete_thread(ids[1], &guest, now).await.unwrap();
        assert_eq!(db.comment_stats().await.unwrap().threads, 1);
    }
}
