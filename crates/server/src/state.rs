use axum::extract::FromRef;
use service::CommentService;
use std::sync::Arc;

use crate::settings::IdentitySettings;

#[derive(Clone)]
pub struct AppState {
    pub service: CommentService,
    pub identity: Arc<IdentitySettings>,
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}
