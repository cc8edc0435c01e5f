use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use service::CommentService;

use crate::http::{error::ApiError, identity::Caller};

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ShareRequest {
    pub page_url: Option<String>,
}

pub async fn share_link(
    State(service): State<CommentService>,
    caller: Caller,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = caller.actor(None, None)?;
    let url = service
        .issue_share_link(&actor, payload.page_url.as_deref())
        .await?;
    Ok(Json(json!({ "url": url })))
}

pub async fn regenerate_share_link(
    State(service): State<CommentService>,
    caller: Caller,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = caller.actor(None, None)?;
    let url = service
        .regenerate_share_link(&actor, payload.page_url.as_deref())
        .await?;
    Ok(Json(json!({ "url": url })))
}
