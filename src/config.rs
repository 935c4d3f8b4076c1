use std::{env, path::PathBuf};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub static_dir: PathBuf,
    pub ai: AiConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Provider calls are skipped entirely when no key is configured.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Operator-preferred models, tried before the built-in ordering.
    pub models: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub relay_url: Option<String>,
    pub from_address: String,
    pub from_name: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let token_ttl_minutes = env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60 * 24 * 7);
        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("frontend"));

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            token_ttl_minutes,
            static_dir,
            ai: AiConfig::from_env(),
            mail: MailConfig::from_env(),
        })
    }
}

impl AiConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("AI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let base_url =
            env::var("AI_BASE_URL").unwrap_or_else(|_| "https://api.cerebras.ai/v1".to_string());
        let models = env::var("AI_MODELS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        let timeout_secs = env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);
        Self {
            api_key,
            base_url,
            models,
            timeout_secs,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.cerebras.ai/v1".to_string(),
            models: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl MailConfig {
    pub fn from_env() -> Self {
        Self {
            relay_url: env::var("MAIL_RELAY_URL").ok().filter(|u| !u.trim().is_empty()),
            from_address: env::var("MAIL_FROM").unwrap_or_else(|_| "info@maniocagri.bj".into()),
            from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "ManiocAgri".into()),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            from_address: "info@maniocagri.bj".into(),
            from_name: "ManiocAgri".into(),
        }
    }
}
