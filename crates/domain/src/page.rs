use serde::Serialize;
use std::fmt;
use url::Url;

/// Query parameter that carries a guest token in shared links.
pub const GUEST_TOKEN_PARAM: &str = "snn_guest_token";

const MAX_PAGE_URL_LEN: usize = 500;

/// Canonical key of the page a comment is anchored to.
///
/// The guest token parameter and the fragment are stripped, so a page keeps
/// one identifier no matter how the visitor arrived at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PageResource(String);

impl PageResource {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("Page URL is required.".to_string());
        }

        let mut url = Url::parse(raw).map_err(|e| format!("Invalid page URL: {}", e))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err("Page URL must be an absolute http(s) URL.".to_string());
        }

        url.set_fragment(None);
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != GUEST_TOKEN_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
        }

        let normalized = String::from(url);
        if normalized.len() > MAX_PAGE_URL_LEN {
            return Err(format!("Page URL is too long (max {} chars).", MAX_PAGE_URL_LEN));
        }
        Ok(Self(normalized))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Link that admits a guest holding `token` to this page.
    pub fn share_url(&self, token: &str) -> String {
        match Url::parse(&self.0) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair(GUEST_TOKEN_PARAM, token);
                url.into()
            }
            Err(_) => {
                let sep = if self.0.contains('?') { '&' } else { '?' };
                format!("{}{}{}={}", self.0, sep, GUEST_TOKEN_PARAM, token)
            }
        }
    }
}

impl fmt::Display for PageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Guest token embedded in a raw page URL, if any.
pub fn guest_token_in(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let token = url
        .query_pairs()
        .find(|(k, _)| k == GUEST_TOKEN_PARAM)
        .map(|(_, v)| v.trim().to_string())?;
    (!token.is_empty()).then_some(token)
}
