use crate::{
    models::{NewGuestToken, SqlGuestToken},
    Db,
};
use chrono::NaiveDateTime;
use domain::{GuestToken, TokenScope};

impl Db {
    pub async fn insert_guest_token(&self, t: &NewGuestToken<'_>) -> anyhow::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO guest_tokens (token, scope, page_resource, issuer, created_at, expires_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?, TRUE)
            "#,
        )
        .bind(t.token)
        .bind(t.scope.kind())
        .bind(t.scope.page().map(|p| p.as_str()))
        .bind(t.issuer)
        .bind(t.now)
        .bind(t.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Deactivates every active token of `t.scope` and inserts `t`, in one
    /// transaction. Returns the new id and how many tokens were retired.
    pub async fn replace_guest_tokens(&self, t: &NewGuestToken<'_>) -> anyhow::Result<(i64, u64)> {
        let mut tx = self.pool.begin().await?;

        let retired = sqlx::query(
            r#"
            UPDATE guest_tokens
            SET is_active = FALSE
            WHERE is_active = TRUE AND scope = ? AND page_resource IS ?
            "#,
        )
        .bind(t.scope.kind())
        .bind(t.scope.page().map(|p| p.as_str()))
        .execute(&mut *tx)
        .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO guest_tokens (token, scope, page_resource, issuer, created_at, expires_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?, TRUE)
            "#,
        )
        .bind(t.token)
        .bind(t.scope.kind())
        .bind(t.scope.page().map(|p| p.as_str()))
        .bind(t.issuer)
        .bind(t.now)
        .bind(t.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((inserted.last_insert_rowid(), retired.rows_affected()))
    }

    /// The record for `token` if it is active and not expired at `now`.
    pub async fn find_active_token(
        &self,
        token: &str,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<GuestToken>> {
        let row = sqlx::query_as::<_, SqlGuestToken>(
            r#"
            SELECT id, token, scope, page_resource, issuer, created_at, expires_at, last_used_at, is_active
            FROM guest_tokens
            WHERE token = ?
              AND is_active = TRUE
              AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(GuestToken::try_from).transpose()
    }

    /// Newest usable token of a scope.
    pub async fn current_token(
        &self,
        scope: &TokenScope,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<GuestToken>> {
        let row = sqlx::query_as::<_, SqlGuestToken>(
            r#"
            SELECT id, token, scope, page_resource, issuer, created_at, expires_at, last_used_at, is_active
            FROM guest_tokens
            WHERE scope = ?
              AND page_resource IS ?
              AND is_active = TRUE
              AND (expires_at IS NULL OR expires_at > ?)
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(scope.kind())
        .bind(scope.page().map(|p| p.as_str()))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(GuestToken::try_from).transpose()
    }

    pub async fn touch_guest_token(&self, id: i64, now: NaiveDateTime) -> anyhow::Result<()> {
        sqlx::query("UPDATE guest_tokens SET last_used_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
