mod comments;
mod error;
mod tokens;

pub use comments::{CommentService, CommentView};
pub use error::ServiceError;
pub use tokens::TokenStore;
