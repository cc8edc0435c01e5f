mod commands;
mod config;
mod models;
pub mod page;
pub mod policy;
mod thread;

pub use commands::CreateComment;
pub use config::{FeatureConfig, MarkerStyle, TokenScopeMode};
pub use models::{
    author_initials, normalize_body, Actor, Author, Comment, CommentId, CommentStats,
    CommentStatus, GuestFingerprint, GuestToken, Position, TokenScope, GUEST_AUTHOR_NAME,
    MAX_BODY_CHARS, TOP_LEVEL,
};
pub use page::PageResource;
pub use thread::{group_threads, Thread, Threaded};
