use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use domain::{page, policy::Denial, Actor};
use service::ServiceError;
use std::convert::Infallible;

use super::error::ApiError;
use crate::state::AppState;

/// Identity material found on a request, before any token is checked.
#[derive(Debug, Default)]
pub struct Caller {
    pub user_id: Option<i64>,
    pub display_name: Option<String>,
    pub session_token: Option<String>,
}

impl Caller {
    /// Picks the acting identity. A signed-in user always wins; otherwise the
    /// guest token comes from the explicit parameter, then from the page URL,
    /// then from the forwarded session.
    pub fn actor(
        &self,
        explicit_token: Option<String>,
        page_url: Option<&str>,
    ) -> Result<Actor, ApiError> {
        if let Some(user_id) = self.user_id {
            return Ok(Actor::Authenticated { user_id });
        }

        explicit_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| page_url.and_then(page::guest_token_in))
            .or_else(|| self.session_token.clone())
            .map(|token| Actor::Guest { token })
            .ok_or_else(|| ServiceError::from(Denial::NotAuthenticated).into())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let ids = &state.identity;

        let user_id = header_str(headers, &ids.user_header).and_then(|raw| match raw.parse::<i64>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                tracing::warn!("Ignoring malformed {} header: {:?}", ids.user_header, raw);
                None
            }
        });

        Ok(Caller {
            user_id,
            display_name: header_str(headers, &ids.name_header).map(str::to_string),
            session_token: header_str(headers, &ids.guest_token_header).map(str::to_string),
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest_token(actor: Actor) -> String {
        match actor {
            Actor::Guest { token } => token,
            other => panic!("expected guest, got {:?}", other),
        }
    }

    #[test]
    fn signed_in_user_wins_over_tokens() {
        let caller = Caller {
            user_id: Some(42),
            session_token: Some("s".into()),
            ..Default::default()
        };
        let actor = caller.actor(Some("explicit".into()), None).ok().unwrap();
        assert_eq!(actor, Actor::Authenticated { user_id: 42 });
    }

    #[test]
    fn explicit_token_beats_url_and_session() {
        let caller = Caller {
            session_token: Some("session".into()),
            ..Default::default()
        };
        let url = "https://site/page?snn_guest_token=from-url";

        let explicit = caller.actor(Some("explicit".into()), Some(url)).ok().unwrap();
        assert_eq!(guest_token(explicit), "explicit");

        let from_url = caller.actor(Some("  ".into()), Some(url)).ok().unwrap();
        assert_eq!(guest_token(from_url), "from-url");

        let from_session = caller.actor(None, Some("https://site/page")).ok().unwrap();
        assert_eq!(guest_token(from_session), "session");
    }

    #[test]
    fn nobody_is_refused() {
        assert!(Caller::default().actor(None, None).is_err());
    }
}
