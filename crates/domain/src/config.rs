use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    Initials,
    Number,
    Icon,
}

/// Which pages a guest token admits its holder to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScopeMode {
    /// One token for the whole site.
    Global,
    /// One token per page.
    Page,
}

/// Feature switches handed to the comment service at construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub enabled: bool,
    pub guest_commenting_enabled: bool,
    pub allow_replies: bool,
    pub marker_style: MarkerStyle,
    pub marker_color: String,
    pub show_in_frontend: bool,
    pub auto_collapse: bool,
    pub token_scope: TokenScopeMode,
    /// 0 means guest tokens never expire.
    pub guest_token_ttl_hours: u32,
    /// Base of share links issued without an explicit page.
    pub site_url: Option<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            guest_commenting_enabled: false,
            allow_replies: true,
            marker_style: MarkerStyle::Initials,
            marker_color: "#0073aa".to_string(),
            show_in_frontend: true,
            auto_collapse: false,
            token_scope: TokenScopeMode::Global,
            guest_token_ttl_hours: 0,
            site_url: None,
        }
    }
}

impl FeatureConfig {
    pub fn guest_token_ttl(&self) -> Option<chrono::Duration> {
        (self.guest_token_ttl_hours > 0)
            .then(|| chrono::Duration::hours(i64::from(self.guest_token_ttl_hours)))
    }
}
