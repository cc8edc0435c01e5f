use config::ConfigError;
use domain::FeatureConfig;
use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "MARGINALIA_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub identity: IdentitySettings,
    #[serde(default)]
    pub features: FeatureConfig,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

/// Headers through which the fronting proxy hands over who is calling.
#[derive(Deserialize, Clone, Debug)]
pub struct IdentitySettings {
    /// Numeric id of the signed-in user. Only trust it behind a proxy that
    /// strips it from client requests.
    pub user_header: String,
    pub name_header: String,
    /// Guest token the proxy recovered from the visitor's session cookie.
    pub guest_token_header: String,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            user_header: "x-user-id".to_string(),
            name_header: "x-user-name".to_string(),
            guest_token_header: "x-guest-token".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();
        let identity = IdentitySettings::default();

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/marginalia.db")?
            .set_default("identity.user_header", identity.user_header)?
            .set_default("identity.name_header", identity.name_header)?
            .set_default("identity.guest_token_header", identity.guest_token_header)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map).map_err(|e| ConfigError::Foreign(Box::new(e)))?,
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

/// `MARGINALIA_FEATURES__ALLOW_REPLIES=0` becomes `features.allow_replies`.
fn collect_env_vars() -> HashMap<String, String> {
    env_to_keys(std::env::vars())
}

fn env_to_keys(vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches(ENV_PREFIX)
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        let vars = vec![
            ("MARGINALIA_SERVER__PORT".to_string(), "8080".to_string()),
            (
                "MARGINALIA_FEATURES__GUEST_COMMENTING_ENABLED".to_string(),
                "true".to_string(),
            ),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ];
        let map = env_to_keys(vars.into_iter());
        assert_eq!(map.len(), 2);
        assert_eq!(map["server.port"], "8080");
        assert_eq!(map["features.guest_commenting_enabled"], "true");
    }
}
