use anyhow::{anyhow, bail};
use chrono::NaiveDateTime;
use domain::{
    Author, Comment, CommentId, GuestFingerprint, GuestToken, PageResource,
    Position, TokenScope,
};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: i64,
    pub parent_id: i64,
    pub author_kind: String,
    pub user_id: Option<i64>,
    pub guest_fingerprint: Option<String>,
    pub author_name: String,
    pub page_resource: String,
    pub pos_x: String,
    pub pos_y: String,
    pub body: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<SqlComment> for Comment {
    type Error = anyhow::Error;

    fn try_from(sql: SqlComment) -> Result<Self, Self::Error> {
        let author = match (sql.author_kind.as_str(), sql.user_id, sql.guest_fingerprint) {
            ("user", Some(user_id), _) => Author::User { user_id },
            ("guest", _, Some(fp)) => Author::Guest {
                fingerprint: GuestFingerprint::from_hex(fp),
            },
            (kind, _, _) => bail!("comment {} has malformed author ({})", sql.id, kind),
        };

        Ok(Comment {
            id: sql.id,
            parent_id: sql.parent_id,
            author,
            author_name: sql.author_name,
            page_resource: PageResource::new_unchecked(sql.page_resource),
            position: Position::new_unchecked(sql.pos_x, sql.pos_y),
            body: sql.body,
            status: sql.status.parse().map_err(|e: String| anyhow!(e))?,
            created_at: sql.created_at,
            updated_at: sql.updated_at,
        })
    }
}

#[derive(FromRow)]
pub struct SqlGuestToken {
    pub id: i64,
    pub token: String,
    pub scope: String,
    pub page_resource: Option<String>,
    pub issuer: i64,
    pub created_at: NaiveDateTime,
    pub expires_at: Option<NaiveDateTime>,
    pub last_used_at: Option<NaiveDateTime>,
    pub is_active: bool,
}

impl TryFrom<SqlGuestToken> for GuestToken {
    type Error = anyhow::Error;

    fn try_from(sql: SqlGuestToken) -> Result<Self, Self::Error> {
        let scope = match (sql.scope.as_str(), sql.page_resource) {
            ("global", _) => TokenScope::Global,
            ("page", Some(page)) => TokenScope::Page(PageResource::new_unchecked(page)),
            (other, _) => bail!("guest token {} has malformed scope ({})", sql.id, other),
        };

        Ok(GuestToken {
            id: sql.id,
            token: sql.token,
            scope,
            issuer: sql.issuer,
            created_at: sql.created_at,
            expires_at: sql.expires_at,
            last_used_at: sql.last_used_at,
            is_active: sql.is_active,
        })
    }
}

/// A validated comment ready to be inserted.
pub struct NewComment<'a> {
    pub parent_id: CommentId,
    pub author: &'a Author,
    pub author_name: &'a str,
    pub page: &'a PageResource,
    pub position: &'a Position,
    pub body: &'a str,
    pub now: NaiveDateTime,
}

pub struct NewGuestToken<'a> {
    pub token: &'a str,
    pub scope: &'a TokenScope,
    pub issuer: i64,
    pub now: NaiveDateTime,
    pub expires_at: Option<NaiveDateTime>,
}

/// `(author_kind, user_id, guest_fingerprint)` columns identifying an author.
pub(crate) fn owner_columns(author: &Author) -> (&'static str, Option<i64>, Option<&str>) {
    match author {
        Author::User { user_id } => (author.kind(), Some(*user_id), None),
        Author::Guest { fingerprint } => (author.kind(), None, Some(fingerprint.as_str())),
    }
}
