use std::net::SocketAddr;

use anyhow::Context;

const DEV_SECRET_KEY: &str = "yamdb-insecure-development-key";

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub secret_key: String,
    pub access_token_ttl_hours: i64,
    pub page_size: u64,
    pub email_from: String,
    pub email_file_path: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://yamdb.db?mode=rwc".to_string());

        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("SECRET_KEY not set, using the insecure development key");
                DEV_SECRET_KEY.to_string()
            },
        };

        let access_token_ttl_hours: i64 =
            std::env::var("ACCESS_TOKEN_TTL_HOURS").ok().and_then(|s| s.parse().ok()).unwrap_or(24);

        let page_size: u64 =
            std::env::var("PAGE_SIZE").ok().and_then(|s| s.parse().ok()).unwrap_or(10);

        let email_from =
            std::env::var("EMAIL_FROM").unwrap_or_else(|_| "noreply@yamdb.local".to_string());
        let email_file_path =
            std::env::var("EMAIL_FILE_PATH").unwrap_or_else(|_| "sent_emails".to_string());

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            secret_key,
            access_token_ttl_hours,
            page_size: page_size.max(1),
            email_from,
            email_file_path,
        })
    }

    /// Settings for in-process use (tests, one-off commands) against `database_url`.
    pub fn local(database_url: impl Into<String>) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: database_url.into(),
            secret_key: DEV_SECRET_KEY.to_string(),
            access_token_ttl_hours: 24,
            page_size: 10,
            email_from: "noreply@yamdb.local".to_string(),
            email_file_path: "sent_emails".to_string(),
        }
    }
}
