//! Who may do what to which comment.
//!
//! Everything here is a pure decision over values the caller has already
//! resolved. Token lookups and database access happen elsewhere.

use crate::models::{Actor, Author, Comment, GuestFingerprint};

#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    Read,
    Create,
    Update(&'a Comment),
    Delete(&'a Comment),
}

/// Facts about the request that the policy cannot work out on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyContext {
    pub guest_commenting_enabled: bool,
    /// Whether the guest's token was accepted by the token store.
    pub guest_token_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("You may only modify your own comments")]
    NotOwner,
}

pub fn authorize(actor: &Actor, action: Action<'_>, ctx: &PolicyContext) -> Result<(), Denial> {
    if !has_access(actor, ctx) {
        return Err(Denial::NotAuthenticated);
    }
    match action {
        Action::Read | Action::Create => Ok(()),
        Action::Update(target) | Action::Delete(target) => {
            if owns(actor, &target.author) {
                Ok(())
            } else {
                Err(Denial::NotOwner)
            }
        }
    }
}

/// Whether `actor` would be allowed to edit or delete `comment`.
pub fn can_modify(actor: &Actor, comment: &Comment, ctx: &PolicyContext) -> bool {
    authorize(actor, Action::Update(comment), ctx).is_ok()
}

fn has_access(actor: &Actor, ctx: &PolicyContext) -> bool {
    match actor {
        Actor::Authenticated { .. } => true,
        Actor::Guest { .. } => ctx.guest_commenting_enabled && ctx.guest_token_valid,
    }
}

fn owns(actor: &Actor, author: &Author) -> bool {
    match (actor, author) {
        (Actor::Authenticated { user_id }, Author::User { user_id: owner }) => user_id == owner,
        (Actor::Guest { token }, Author::Guest { fingerprint }) => {
            GuestFingerprint::of(token) == *fingerprint
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentStatus, Position};
    use crate::page::PageResource;

    fn comment_by(author: Author) -> Comment {
        let now = chrono::Utc::now().naive_utc();
        Comment {
            id: 1,
            parent_id: 0,
            author,
            author_name: "someone".into(),
            page_resource: PageResource::new_unchecked("https://site/page".into()),
            position: Position::new_unchecked("1px".into(), "2px".into()),
            body: "hi".into(),
            status: CommentStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: i64) -> Actor {
        Actor::Authenticated { user_id: id }
    }

    fn guest(token: &str) -> Actor {
        Actor::Guest { token: token.into() }
    }

    const GUEST_OK: PolicyContext = PolicyContext {
        guest_commenting_enabled: true,
        guest_token_valid: true,
    };

    #[test]
    fn authenticated_users_read_and_create() {
        let ctx = PolicyContext::default();
        assert_eq!(authorize(&user(42), Action::Read, &ctx), Ok(()));
        assert_eq!(authorize(&user(42), Action::Create, &ctx), Ok(()));
    }

    #[test]
    fn guests_need_feature_and_valid_token() {
        let g = guest("t");
        assert_eq!(authorize(&g, Action::Read, &GUEST_OK), Ok(()));

        let disabled = PolicyContext {
            guest_commenting_enabled: false,
            guest_token_valid: true,
        };
        assert_eq!(
            authorize(&g, Action::Create, &disabled),
            Err(Denial::NotAuthenticated)
        );

        let bad_token = PolicyContext {
            guest_commenting_enabled: true,
            guest_token_valid: false,
        };
        assert_eq!(
            authorize(&g, Action::Read, &bad_token),
            Err(Denial::NotAuthenticated)
        );
    }

    #[test]
    fn only_the_author_may_modify() {
        let c = comment_by(user(42).author());
        let ctx = PolicyContext::default();
        assert_eq!(authorize(&user(42), Action::Update(&c), &ctx), Ok(()));
        assert_eq!(authorize(&user(42), Action::Delete(&c), &ctx), Ok(()));
        assert_eq!(
            authorize(&user(7), Action::Delete(&c), &ctx),
            Err(Denial::NotOwner)
        );
        assert_eq!(
            authorize(&guest("t"), Action::Update(&c), &GUEST_OK),
            Err(Denial::NotOwner)
        );
    }

    #[test]
    fn guests_are_told_apart_by_token() {
        let c = comment_by(guest("alpha").author());
        assert!(can_modify(&guest("alpha"), &c, &GUEST_OK));
        assert!(!can_modify(&guest("beta"), &c, &GUEST_OK));
        assert!(!can_modify(&user(1), &c, &PolicyContext::default()));
    }

    #[test]
    fn owner_guest_loses_rights_when_guests_are_disabled() {
        let c = comment_by(guest("alpha").author());
        let disabled = PolicyContext {
            guest_commenting_enabled: false,
            guest_token_valid: true,
        };
        assert_eq!(
            authorize(&guest("alpha"), Action::Delete(&c), &disabled),
            Err(Denial::NotAuthenticated)
        );
    }
}
