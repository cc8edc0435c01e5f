use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::{CommentId, CreateComment, Thread, TOP_LEVEL};
use serde::Deserialize;
use serde_json::{json, Value};
use service::{CommentService, CommentView};

use crate::http::{error::ApiError, identity::Caller};

#[derive(Deserialize)]
pub struct PageQuery {
    pub page_url: String,
    pub guest_token: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub page_url: String,
    #[serde(alias = "comment")]
    pub body: String,
    pub pos_x: String,
    pub pos_y: String,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    pub guest_token: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(alias = "comment")]
    pub body: String,
    pub guest_token: Option<String>,
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub guest_token: Option<String>,
}

pub async fn list_comments(
    State(service): State<CommentService>,
    caller: Caller,
    Query(q): Query<PageQuery>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let actor = caller.actor(q.guest_token, Some(&q.page_url))?;
    let comments = service.list_comments(&actor, &q.page_url).await?;
    Ok(Json(comments))
}

pub async fn list_threads(
    State(service): State<CommentService>,
    caller: Caller,
    Query(q): Query<PageQuery>,
) -> Result<Json<Vec<Thread<CommentView>>>, ApiError> {
    let actor = caller.actor(q.guest_token, Some(&q.page_url))?;
    let threads = service.list_threads(&actor, &q.page_url).await?;
    Ok(Json(threads))
}

pub async fn post_comment(
    State(service): State<CommentService>,
    caller: Caller,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = caller.actor(payload.guest_token, Some(&payload.page_url))?;

    let cmd = CreateComment {
        page_url: payload.page_url,
        body: payload.body,
        pos_x: payload.pos_x,
        pos_y: payload.pos_y,
        parent_id: payload.parent_id.unwrap_or(TOP_LEVEL),
        author_name: caller.display_name,
    };
    let id = service.create_comment(&actor, cmd).await?;
    Ok(Json(json!({ "id": id })))
}

pub async fn update_comment(
    State(service): State<CommentService>,
    caller: Caller,
    Path(id): Path<CommentId>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = caller.actor(payload.guest_token, None)?;
    service.update_comment(&actor, id, &payload.body).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn delete_comment(
    State(service): State<CommentService>,
    caller: Caller,
    Path(id): Path<CommentId>,
    Query(q): Query<TokenQuery>,
) -> Result<Json<Value>, ApiError> {
    let actor = caller.actor(q.guest_token, None)?;
    service.delete_comment(&actor, id).await?;
    Ok(Json(json!({ "success": true })))
}
