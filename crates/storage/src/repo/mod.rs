mod comments;
mod stats;
mod tokens;
