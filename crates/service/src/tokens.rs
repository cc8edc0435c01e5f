use chrono::Utc;
use domain::{FeatureConfig, GuestToken, PageResource, TokenScope, TokenScopeMode};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use storage::{Db, NewGuestToken};
use tracing::{debug, info};

use crate::ServiceError;

const TOKEN_BYTES: usize = 32;

/// Issues and checks the secrets behind guest share links.
#[derive(Clone)]
pub struct TokenStore {
    db: Db,
    features: Arc<FeatureConfig>,
}

impl TokenStore {
    pub fn new(db: Db, features: Arc<FeatureConfig>) -> Self {
        Self { db, features }
    }

    pub async fn issue_token(
        &self,
        issuer: i64,
        page: Option<&PageResource>,
    ) -> Result<String, ServiceError> {
        let scope = self.scope_for(page)?;
        let token = generate_token();
        let id = self.db.insert_guest_token(&self.new_record(&token, &scope, issuer)).await?;
        info!("Guest token {} issued by user {} ({})", id, issuer, scope.kind());
        Ok(token)
    }

    /// Issues a token and retires every other token of the same scope, so
    /// links carrying the old one stop working at once.
    pub async fn regenerate_token(
        &self,
        issuer: i64,
        page: Option<&PageResource>,
    ) -> Result<String, ServiceError> {
        let scope = self.scope_for(page)?;
        let token = generate_token();
        let (id, retired) = self
            .db
            .replace_guest_tokens(&self.new_record(&token, &scope, issuer))
            .await?;
        info!(
            "Guest token {} regenerated by user {} ({}), {} retired",
            id,
            issuer,
            scope.kind(),
            retired
        );
        Ok(token)
    }

    /// The token currently shared for this scope, issuing one if none is live.
    pub async fn current_or_issue(
        &self,
        issuer: i64,
        page: Option<&PageResource>,
    ) -> Result<String, ServiceError> {
        let scope = self.scope_for(page)?;
        let now = Utc::now().naive_utc();
        match self.db.current_token(&scope, now).await? {
            Some(existing) => Ok(existing.token),
            None => self.issue_token(issuer, page).await,
        }
    }

    /// Whether `token` currently admits a guest to `page`. No side effects.
    pub async fn validate_token(
        &self,
        token: &str,
        page: Option<&PageResource>,
    ) -> Result<bool, ServiceError> {
        Ok(self.lookup(token, page).await?.is_some())
    }

    /// Like [`validate_token`](Self::validate_token), and records the use.
    pub async fn admit_guest(
        &self,
        token: &str,
        page: Option<&PageResource>,
    ) -> Result<bool, ServiceError> {
        match self.lookup(token, page).await? {
            Some(record) => {
                self.db
                    .touch_guest_token(record.id, Utc::now().naive_utc())
                    .await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn lookup(
        &self,
        token: &str,
        page: Option<&PageResource>,
    ) -> Result<Option<GuestToken>, ServiceError> {
        if !self.features.guest_commenting_enabled || token.is_empty() {
            return Ok(None);
        }

        let now = Utc::now().naive_utc();
        let Some(record) = self.db.find_active_token(token, now).await? else {
            debug!("Rejected unknown or retired guest token");
            return Ok(None);
        };

        let in_scope = match (&record.scope, self.features.token_scope) {
            (TokenScope::Global, TokenScopeMode::Global) => true,
            (TokenScope::Page(bound), TokenScopeMode::Page) => page == Some(bound),
            _ => false,
        };
        if !in_scope || !record.is_usable_at(now) {
            debug!("Rejected guest token {} outside its scope", record.id);
            return Ok(None);
        }
        Ok(Some(record))
    }

    fn scope_for(&self, page: Option<&PageResource>) -> Result<TokenScope, ServiceError> {
        match self.features.token_scope {
            TokenScopeMode::Global => Ok(TokenScope::Global),
            TokenScopeMode::Page => page.cloned().map(TokenScope::Page).ok_or_else(|| {
                ServiceError::Validation(
                    "A page URL is required for page-scoped share links".to_string(),
                )
            }),
        }
    }

    fn new_record<'a>(
        &self,
        token: &'a str,
        scope: &'a TokenScope,
        issuer: i64,
    ) -> NewGuestToken<'a> {
        let now = Utc::now().naive_utc();
        NewGuestToken {
            token,
            scope,
            issuer,
            now,
            expires_at: self.features.guest_token_ttl().map(|ttl| now + ttl),
        }
    }
}

/// 256 bits from the OS CSPRNG, hex encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(features: FeatureConfig) -> TokenStore {
        let db = Db::in_memory().await.unwrap();
        TokenStore::new(db, Arc::new(features))
    }

    fn guests_on() -> FeatureConfig {
        FeatureConfig {
            guest_commenting_enabled: true,
            ..Default::default()
        }
    }

    fn page(url: &str) -> PageResource {
        PageResource::parse(url).unwrap()
    }

    #[test]
    fn tokens_are_long_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn regenerate_invalidates_previous_token() {
        let tokens = store(guests_on()).await;
        let old = tokens.issue_token(42, None).await.unwrap();
        assert!(tokens.validate_token(&old, None).await.unwrap());

        let new = tokens.regenerate_token(42, None).await.unwrap();
        assert_ne!(old, new);
        assert!(!tokens.validate_token(&old, None).await.unwrap());
        assert!(tokens.validate_token(&new, None).await.unwrap());
    }

    #[tokio::test]
    async fn nothing_validates_with_guests_disabled() {
        let db = Db::in_memory().await.unwrap();
        let enabled = TokenStore::new(db.clone(), Arc::new(guests_on()));
        let token = enabled.issue_token(1, None).await.unwrap();

        let disabled = TokenStore::new(db, Arc::new(FeatureConfig::default()));
        assert!(!disabled.validate_token(&token, None).await.unwrap());
        assert!(!disabled.admit_guest(&token, None).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_and_empty_tokens_fail_closed() {
        let tokens = store(guests_on()).await;
        assert!(!tokens.validate_token("nope", None).await.unwrap());
        assert!(!tokens.validate_token("", None).await.unwrap());
    }

    #[tokio::test]
    async fn page_scoped_tokens_stay_on_their_page() {
        let tokens = store(FeatureConfig {
            token_scope: TokenScopeMode::Page,
            ..guests_on()
        })
        .await;
        let a = page("https://site.example/a");
        let b = page("https://site.example/b");

        let token = tokens.issue_token(1, Some(&a)).await.unwrap();
        assert!(tokens.validate_token(&token, Some(&a)).await.unwrap());
        assert!(!tokens.validate_token(&token, Some(&b)).await.unwrap());
        assert!(!tokens.validate_token(&token, None).await.unwrap());

        assert!(matches!(
            tokens.issue_token(1, None).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn switching_scope_mode_retires_old_kind() {
        let db = Db::in_memory().await.unwrap();
        let global = TokenStore::new(db.clone(), Arc::new(guests_on()));
        let token = global.issue_token(1, None).await.unwrap();

        let per_page = TokenStore::new(
            db,
            Arc::new(FeatureConfig {
                token_scope: TokenScopeMode::Page,
                ..guests_on()
            }),
        );
        let p = page("https://site.example/a");
        assert!(!per_page.validate_token(&token, Some(&p)).await.unwrap());
    }

    #[tokio::test]
    async fn share_link_token_is_reused_until_regenerated() {
        let tokens = store(guests_on()).await;
        let first = tokens.current_or_issue(1, None).await.unwrap();
        let again = tokens.current_or_issue(2, None).await.unwrap();
        assert_eq!(first, again);

        let rotated = tokens.regenerate_token(1, None).await.unwrap();
        assert_eq!(tokens.current_or_issue(1, None).await.unwrap(), rotated);
    }

    #[tokio::test]
    async fn admit_guest_records_last_use() {
        let db = Db::in_memory().await.unwrap();
        let tokens = TokenStore::new(db.clone(), Arc::new(guests_on()));
        let token = tokens.issue_token(1, None).await.unwrap();

        let now = Utc::now().naive_utc();
        let before = db.find_active_token(&token, now).await.unwrap().unwrap();
        assert!(before.last_used_at.is_none());

        tokens.validate_token(&token, None).await.unwrap();
        let still = db.find_active_token(&token, now).await.unwrap().unwrap();
        assert!(still.last_used_at.is_none());

        assert!(tokens.admit_guest(&token, None).await.unwrap());
        let after = db.find_active_token(&token, now).await.unwrap().unwrap();
        assert!(after.last_used_at.is_some());
    }

    #[tokio::test]
    async fn expiry_follows_configured_ttl() {
        let db = Db::in_memory().await.unwrap();
        let tokens = TokenStore::new(
            db.clone(),
            Arc::new(FeatureConfig {
                guest_token_ttl_hours: 2,
                ..guests_on()
            }),
        );
        let token = tokens.issue_token(1, None).await.unwrap();
        let now = Utc::now().naive_utc();

        let record = db.find_active_token(&token, now).await.unwrap().unwrap();
        let expires = record.expires_at.unwrap();
        assert!(expires > now + chrono::Duration::minutes(119));
        assert!(db
            .find_active_token(&token, now + chrono::Duration::hours(3))
            .await
            .unwrap()
            .is_none());
    }
}
