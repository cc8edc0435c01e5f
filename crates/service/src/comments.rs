//! Comment use cases: list, create, edit, delete, share.
//!
//! Every operation resolves guest access through the [`TokenStore`], asks
//! [`domain::policy`] for a decision and then performs a single conditional
//! write, so ownership is re-checked by the store at the moment of mutation.

use chrono::Utc;
use domain::{
    author_initials, group_threads, normalize_body,
    policy::{self, Action, Denial, PolicyContext},
    Actor, Comment, CommentId, CommentStats, CreateComment, FeatureConfig, PageResource,
    Position, Thread, Threaded, GUEST_AUTHOR_NAME, TOP_LEVEL,
};
use serde::Serialize;
use std::sync::Arc;
use storage::{Db, NewComment};
use tracing::{info, warn};

use crate::{ServiceError, TokenStore};

/// A comment as shown to one particular actor.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_initials: String,
    /// Whether the viewing actor may edit or delete it.
    pub editable: bool,
}

impl Threaded for CommentView {
    fn id(&self) -> CommentId {
        self.comment.id
    }

    fn parent_id(&self) -> CommentId {
        self.comment.parent_id
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Update,
    Delete,
}

#[derive(Clone)]
pub struct CommentService {
    db: Db,
    tokens: TokenStore,
    features: Arc<FeatureConfig>,
}

impl CommentService {
    pub fn new(db: Db, features: FeatureConfig) -> Self {
        let features = Arc::new(features);
        Self {
            tokens: TokenStore::new(db.clone(), features.clone()),
            db,
            features,
        }
    }

    pub fn features(&self) -> &FeatureConfig {
        &self.features
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub async fn list_comments(
        &self,
        actor: &Actor,
        page_url: &str,
    ) -> Result<Vec<CommentView>, ServiceError> {
        self.ensure_enabled()?;
        let page = parse_page(page_url)?;
        let ctx = self.access(actor, Some(&page)).await?;
        policy::authorize(actor, Action::Read, &ctx)?;

        let comments = self.db.list_comments(&page).await?;
        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                editable: policy::can_modify(actor, &comment, &ctx),
                author_initials: author_initials(&comment.author_name),
                comment,
            })
            .collect())
    }

    pub async fn list_threads(
        &self,
        actor: &Actor,
        page_url: &str,
    ) -> Result<Vec<Thread<CommentView>>, ServiceError> {
        let flat = self.list_comments(actor, page_url).await?;
        Ok(group_threads(flat))
    }

    pub async fn create_comment(
        &self,
        actor: &Actor,
        cmd: CreateComment,
    ) -> Result<CommentId, ServiceError> {
        self.ensure_enabled()?;
        let page = parse_page(&cmd.page_url)?;
        let body = normalize_body(&cmd.body).map_err(ServiceError::Validation)?;
        let position = Position::new(cmd.pos_x, cmd.pos_y).map_err(ServiceError::Validation)?;

        let ctx = self.access(actor, Some(&page)).await?;
        policy::authorize(actor, Action::Create, &ctx)?;

        if cmd.parent_id != TOP_LEVEL {
            self.check_parent(cmd.parent_id, &page).await?;
        }

        let author = actor.author();
        let author_name = match actor {
            Actor::Guest { .. } => GUEST_AUTHOR_NAME.to_string(),
            Actor::Authenticated { user_id } => cmd
                .author_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("User {}", user_id)),
        };

        let inserted = self
            .db
            .insert_comment(&NewComment {
                parent_id: cmd.parent_id,
                author: &author,
                author_name: &author_name,
                page: &page,
                position: &position,
                body: &body,
                now: Utc::now().naive_utc(),
            })
            .await?;

        // 父评论可能在检查之后、插入之前被删除
        let id = inserted
            .ok_or_else(|| ServiceError::Validation("Parent comment not found".to_string()))?;
        info!(
            "Comment {} created on {} by {:?} (parent {})",
            id, page, actor, cmd.parent_id
        );
        Ok(id)
    }

    pub async fn update_comment(
        &self,
        actor: &Actor,
        id: CommentId,
        body: &str,
    ) -> Result<(), ServiceError> {
        self.ensure_enabled()?;
        let body = normalize_body(body).map_err(ServiceError::Validation)?;
        let target = self.owned_target(actor, id, Mutation::Update).await?;

        let changed = self
            .db
            .update_comment_body(target.id, &actor.author(), &body, Utc::now().naive_utc())
            .await?;
        if changed == 0 {
            return Err(ServiceError::not_owner());
        }
        info!("Comment {} updated by {:?}", id, actor);
        Ok(())
    }

    /// Soft-deletes a comment together with its replies.
    pub async fn delete_comment(&self, actor: &Actor, id: CommentId) -> Result<(), ServiceError> {
        self.ensure_enabled()?;
        let target = self.owned_target(actor, id, Mutation::Delete).await?;

        let removed = self
            .db
            .delete_thread(target.id, &actor.author(), Utc::now().naive_utc())
            .await?;
        if removed == 0 {
            return Err(ServiceError::not_owner());
        }
        info!("Comment {} deleted by {:?} ({} rows)", id, actor, removed);
        Ok(())
    }

    /// Link that lets guests comment, reusing the live token of the scope.
    pub async fn issue_share_link(
        &self,
        actor: &Actor,
        page_url: Option<&str>,
    ) -> Result<String, ServiceError> {
        let (issuer, page) = self.share_target(actor, page_url)?;
        let token = self.tokens.current_or_issue(issuer, Some(&page)).await?;
        Ok(page.share_url(&token))
    }

    /// Fresh link; every link handed out before for the scope stops working.
    pub async fn regenerate_share_link(
        &self,
        actor: &Actor,
        page_url: Option<&str>,
    ) -> Result<String, ServiceError> {
        let (issuer, page) = self.share_target(actor, page_url)?;
        let token = self.tokens.regenerate_token(issuer, Some(&page)).await?;
        Ok(page.share_url(&token))
    }

    pub async fn stats(&self, actor: &Actor) -> Result<CommentStats, ServiceError> {
        self.ensure_enabled()?;
        if actor.user_id().is_none() {
            return Err(Denial::NotAuthenticated.into());
        }
        Ok(self.db.comment_stats().await?)
    }

    fn ensure_enabled(&self) -> Result<(), ServiceError> {
        if self.features.enabled {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Comments are disabled".to_string()))
        }
    }

    async fn access(
        &self,
        actor: &Actor,
        page: Option<&PageResource>,
    ) -> Result<PolicyContext, ServiceError> {
        let guest_token_valid = match actor {
            Actor::Guest { token } if self.features.guest_commenting_enabled => {
                self.tokens.admit_guest(token, page).await?
            }
            _ => false,
        };
        Ok(PolicyContext {
            guest_commenting_enabled: self.features.guest_commenting_enabled,
            guest_token_valid,
        })
    }

    /// Loads `id` and runs the ownership policy for `action`.
    ///
    /// Every failure is reported as `NotOwner`, so a caller cannot tell a
    /// missing comment from one it may not touch.
    async fn owned_target(
        &self,
        actor: &Actor,
        id: CommentId,
        mutation: Mutation,
    ) -> Result<Comment, ServiceError> {
        let Some(target) = self.db.get_comment(id).await? else {
            warn!("{:?} tried to modify unavailable comment {}", actor, id);
            return Err(ServiceError::not_owner());
        };

        let ctx = self.access(actor, Some(&target.page_resource)).await?;
        let action = match mutation {
            Mutation::Update => Action::Update(&target),
            Mutation::Delete => Action::Delete(&target),
        };
        if let Err(denial) = policy::authorize(actor, action, &ctx) {
            warn!("{:?} denied on comment {}: {}", actor, id, denial);
            return Err(ServiceError::not_owner());
        }
        Ok(target)
    }

    async fn check_parent(&self, parent_id: CommentId, page: &PageResource) -> Result<(), ServiceError> {
        if !self.features.allow_replies {
            return Err(ServiceError::Validation("Replies are disabled".to_string()));
        }
        match self.db.get_comment(parent_id).await? {
            Some(parent) if parent.page_resource != *page => Err(ServiceError::Validation(
                "Parent comment not found".to_string(),
            )),
            Some(parent) if parent.is_reply() => Err(ServiceError::Validation(
                "Replies can only target top-level comments".to_string(),
            )),
            Some(_) => Ok(()),
            None => Err(ServiceError::Validation(
                "Parent comment not found".to_string(),
            )),
        }
    }

    fn share_target(
        &self,
        actor: &Actor,
        page_url: Option<&str>,
    ) -> Result<(i64, PageResource), ServiceError> {
        self.ensure_enabled()?;
        let issuer = actor.user_id().ok_or(Denial::NotAuthenticated)?;
        if !self.features.guest_commenting_enabled {
            return Err(ServiceError::Forbidden(
                "Guest commenting is not enabled".to_string(),
            ));
        }

        let page = match page_url.or(self.features.site_url.as_deref()) {
            Some(url) => parse_page(url)?,
            None => {
                return Err(ServiceError::Validation(
                    "A page URL is required to build a share link".to_string(),
                ))
            }
        };
        Ok((issuer, page))
    }
}

fn parse_page(raw: &str) -> Result<PageResource, ServiceError> {
    PageResource::parse(raw).map_err(ServiceError::Validation)
}
