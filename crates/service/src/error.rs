use domain::policy::Denial;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Bad input. The message is safe to show to the caller.
    #[error("{0}")]
    Validation(String),
    /// Generic denial. Also covers comments that do not exist.
    #[error("{0}")]
    Forbidden(String),
    /// Persistence failure. Detail stays in the source chain for logging.
    #[error("storage failure")]
    Store(#[from] anyhow::Error),
}

impl From<Denial> for ServiceError {
    fn from(d: Denial) -> Self {
        ServiceError::Forbidden(d.to_string())
    }
}

impl ServiceError {
    pub(crate) fn not_owner() -> Self {
        Denial::NotOwner.into()
    }
}
