pub mod comments;
pub mod settings;
pub mod share;
