use chrono::NaiveDateTime;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::page::PageResource;

pub type CommentId = i64;

/// `parent_id` of a top-level comment.
pub const TOP_LEVEL: CommentId = 0;

pub const MAX_BODY_CHARS: usize = 5000;
const MAX_COORD_LEN: usize = 20;
pub const GUEST_AUTHOR_NAME: &str = "Guest";

/// Whoever is performing the current request.
#[derive(Clone, PartialEq, Eq)]
pub enum Actor {
    Authenticated { user_id: i64 },
    Guest { token: String },
}

impl Actor {
    /// The author value a comment created by this actor carries.
    pub fn author(&self) -> Author {
        match self {
            Actor::Authenticated { user_id } => Author::User { user_id: *user_id },
            Actor::Guest { token } => Author::Guest {
                fingerprint: GuestFingerprint::of(token),
            },
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Actor::Authenticated { user_id } => Some(*user_id),
            Actor::Guest { .. } => None,
        }
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Authenticated { user_id } => write!(f, "Authenticated({})", user_id),
            Actor::Guest { .. } => write!(f, "Guest(<redacted>)"),
        }
    }
}

/// SHA-256 of a guest token. Comments keep this instead of the token itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestFingerprint(String);

impl GuestFingerprint {
    pub fn of(token: &str) -> Self {
        Self(hex::encode(Sha256::digest(token.as_bytes())))
    }

    pub fn from_hex(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Author {
    User {
        user_id: i64,
    },
    Guest {
        #[serde(skip)]
        fingerprint: GuestFingerprint,
    },
}

impl Author {
    pub fn kind(&self) -> &'static str {
        match self {
            Author::User { .. } => "user",
            Author::Guest { .. } => "guest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Active,
    Deleted,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Active => "active",
            CommentStatus::Deleted => "deleted",
        }
    }
}

impl FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CommentStatus::Active),
            "deleted" => Ok(CommentStatus::Deleted),
            other => Err(format!("Unknown comment status: {}", other)),
        }
    }
}

/// Anchor of a comment marker, in page-relative coordinates such as `"120px"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: String,
    pub y: String,
}

impl Position {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Result<Self, String> {
        let x = parse_coord("x", x.into())?;
        let y = parse_coord("y", y.into())?;
        Ok(Self { x, y })
    }

    pub fn new_unchecked(x: String, y: String) -> Self {
        Self { x, y }
    }
}

fn parse_coord(axis: &str, raw: String) -> Result<String, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(format!("Position {} is required.", axis));
    }
    if s.len() > MAX_COORD_LEN {
        return Err(format!("Position {} is too long (max {} chars).", axis, MAX_COORD_LEN));
    }

    let unit_start = s
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(unit_start);

    let valid_number = number
        .trim_end()
        .parse::<f64>()
        .map(|n| n.is_finite())
        .unwrap_or(false);
    let valid_unit = unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%');

    if !valid_number || !valid_unit {
        return Err(format!("Position {} is not a valid coordinate: {}", axis, s));
    }
    Ok(s.to_string())
}

/// Trims a comment body and checks it is usable.
pub fn normalize_body(raw: &str) -> Result<String, String> {
    let body = raw.trim();
    if body.is_empty() {
        return Err("Comment is required".to_string());
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(format!("Comment is too long (max {} chars).", MAX_BODY_CHARS));
    }
    Ok(body.to_string())
}

/// Two-letter badge shown on markers, e.g. "Ada Lovelace" -> "AL".
pub fn author_initials(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.as_slice() {
        [] => "?".to_string(),
        [single] => single.chars().take(2).collect::<String>().to_uppercase(),
        [first, .., last] => {
            let mut out = String::new();
            out.extend(first.chars().next());
            out.extend(last.chars().next());
            out.to_uppercase()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub parent_id: CommentId,
    pub author: Author,
    pub author_name: String,
    pub page_resource: PageResource,
    pub position: Position,
    pub body: String,
    pub status: CommentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id != TOP_LEVEL
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenScope {
    Global,
    Page(PageResource),
}

impl TokenScope {
    pub fn kind(&self) -> &'static str {
        match self {
            TokenScope::Global => "global",
            TokenScope::Page(_) => "page",
        }
    }

    pub fn page(&self) -> Option<&PageResource> {
        match self {
            TokenScope::Global => None,
            TokenScope::Page(p) => Some(p),
        }
    }
}

#[derive(Clone)]
pub struct GuestToken {
    pub id: i64,
    pub token: String,
    pub scope: TokenScope,
    pub issuer: i64,
    pub created_at: NaiveDateTime,
    pub expires_at: Option<NaiveDateTime>,
    pub last_used_at: Option<NaiveDateTime>,
    pub is_active: bool,
}

impl GuestToken {
    pub fn is_usable_at(&self, now: NaiveDateTime) -> bool {
        self.is_active && self.expires_at.map_or(true, |exp| exp > now)
    }
}

impl fmt::Debug for GuestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestToken")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("issuer", &self.issuer)
            .field("expires_at", &self.expires_at)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommentStats {
    pub threads: i64,
    pub replies: i64,
    pub authors: i64,
}
