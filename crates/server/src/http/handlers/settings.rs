use axum::{extract::State, Json};
use domain::CommentStats;
use serde_json::{json, Value};
use service::CommentService;

use crate::http::{error::ApiError, identity::Caller};

/// Flags the page script needs to draw markers and enable actions.
pub async fn get_settings(State(service): State<CommentService>) -> Json<Value> {
    let f = service.features();
    Json(json!({
        "enabled": f.enabled,
        "show_in_frontend": f.show_in_frontend,
        "allow_replies": f.allow_replies,
        "guest_commenting_enabled": f.guest_commenting_enabled,
        "marker_style": f.marker_style,
        "marker_color": f.marker_color,
        "auto_collapse": f.auto_collapse,
    }))
}

pub async fn get_stats(
    State(service): State<CommentService>,
    caller: Caller,
) -> Result<Json<CommentStats>, ApiError> {
    let actor = caller.actor(None, None)?;
    Ok(Json(service.stats(&actor).await?))
}
