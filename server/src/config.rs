use std::time::Duration;

use color_eyre::eyre::{eyre, WrapErr as _};

use crate::{chat::ChatConfig, storage::StorageConfig};

pub const DEFAULT_TECH_GROUP_ORDER: &str =
    "Frontend,Core Frontend Concepts,Languages,Databases & Cache,Tools & Platforms";

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Everything the server reads from the environment at boot
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub domain: String,
    pub protocol: String,
    pub port: u16,
    pub session_duration_days: i64,
    /// When unset the setup-admin endpoint answers 404
    pub admin_setup_token: Option<String>,
    pub signed_url_ttl: Duration,
    pub max_upload_bytes: usize,
    pub site_owner: String,
    pub site_tagline: String,
    pub tech_group_order: Vec<String>,
    pub storage: StorageConfig,
    /// `None` disables the assistant endpoint
    pub chat: Option<ChatConfig>,
}

impl AppConfig {
    /// Defaults for everything except the database url, with in-memory storage
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            domain: "localhost:3000".to_string(),
            protocol: "https".to_string(),
            port: 3000,
            session_duration_days: 7,
            admin_setup_token: None,
            signed_url_ttl: Duration::from_secs(3600),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            site_owner: "Portfolio Owner".to_string(),
            site_tagline: "I build things for the web".to_string(),
            tech_group_order: parse_group_order(DEFAULT_TECH_GROUP_ORDER),
            storage: StorageConfig::Memory,
            chat: None,
        }
    }

    pub fn from_env() -> color_eyre::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| eyre!("DATABASE_URL must be set"))?;
        let mut config = Self::new(database_url);

        if let Some(domain) = env_non_empty("DOMAIN") {
            config.domain = domain;
        }
        if let Some(protocol) = env_non_empty("PROTO") {
            config.protocol = protocol;
        }
        if let Some(port) = env_non_empty("PORT") {
            config.port = port.parse().wrap_err("PORT must be a valid port number")?;
        }
        if let Some(days) = env_non_empty("SESSION_DURATION_DAYS") {
            config.session_duration_days = days
                .parse()
                .wrap_err("SESSION_DURATION_DAYS must be a whole number of days")?;
        }
        config.admin_setup_token = env_non_empty("ADMIN_SETUP_TOKEN");
        if let Some(ttl) = env_non_empty("SIGNED_URL_TTL_SECS") {
            let secs: u64 = ttl
                .parse()
                .wrap_err("SIGNED_URL_TTL_SECS must be a number of seconds")?;
            config.signed_url_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = env_non_empty("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = max
                .parse()
                .wrap_err("MAX_UPLOAD_BYTES must be a number of bytes")?;
        }
        if let Some(owner) = env_non_empty("SITE_OWNER") {
            config.site_owner = owner;
        }
        if let Some(tagline) = env_non_empty("SITE_TAGLINE") {
            config.site_tagline = tagline;
        }
        if let Some(order) = env_non_empty("TECH_GROUP_ORDER") {
            config.tech_group_order = parse_group_order(&order);
        }

        config.storage = StorageConfig::from_env().wrap_err("Invalid storage configuration")?;
        config.chat = ChatConfig::from_env();

        Ok(config)
    }

    pub fn is_secure(&self) -> bool {
        self.protocol == "https"
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Reads a variable, treating blank values as unset
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_group_order(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_order_skips_blanks() {
        assert_eq!(
            parse_group_order(" Frontend , ,Languages,"),
            vec!["Frontend".to_string(), "Languages".to_string()]
        );
    }

    #[test]
    fn test_default_group_order() {
        let config = AppConfig::new("postgres://localhost/portfolio");

        assert_eq!(config.tech_group_order.len(), 5);
        assert_eq!(config.tech_group_order[3], "Databases & Cache");
        assert!(config.is_secure());
        assert_eq!(config.base_url(), "https://localhost:3000");
    }
}
