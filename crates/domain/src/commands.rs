use crate::models::{CommentId, TOP_LEVEL};

/// Input of a new comment, as received from the transport.
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub page_url: String,
    pub body: String,
    pub pos_x: String,
    pub pos_y: String,
    pub parent_id: CommentId,
    /// Display name of an authenticated author. Ignored for guests.
    pub author_name: Option<String>,
}

impl CreateComment {
    pub fn top_level(
        page_url: impl Into<String>,
        body: impl Into<String>,
        pos_x: impl Into<String>,
        pos_y: impl Into<String>,
    ) -> Self {
        Self {
            page_url: page_url.into(),
            body: body.into(),
            pos_x: pos_x.into(),
            pos_y: pos_y.into(),
            parent_id: TOP_LEVEL,
            author_name: None,
        }
    }

    pub fn reply_to(mut self, parent_id: CommentId) -> Self {
        self.parent_id = parent_id;
        self
    }
}
