use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::America::Chicago;
use std::env;

const DEV_ADMIN_PASSWORD: &str = "change-me";
const DEV_SESSION_SECRET: &str = "dev-secret-change-me";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub admin_password: String,
    pub session_secret: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    /// Public origin used for checkout return URLs, e.g. `https://votes.example.com`.
    pub base_url: Option<String>,
    pub voting_end: Option<DateTime<FixedOffset>>,
    pub templates_dir: String,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                let path = env::var("DB_PATH").unwrap_or_else(|_| "votes.db".into());
                format!("sqlite://{}?mode=rwc", path)
            }
        };
        let port = match env::var("PORT") {
            Ok(port) => port.parse().context("PORT must be a valid port number")?,
            Err(_) => 8080,
        };

        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!("ADMIN_PASSWORD is not set, using the development default");
            DEV_ADMIN_PASSWORD.into()
        });
        let session_secret = env::var("SESSION_SECRET").unwrap_or_else(|_| {
            tracing::warn!("SESSION_SECRET is not set, using the development default");
            DEV_SESSION_SECRET.into()
        });

        let stripe_secret_key = non_empty_var("STRIPE_SECRET_KEY");
        let stripe_webhook_secret = non_empty_var("STRIPE_WEBHOOK_SECRET");
        let base_url = non_empty_var("BASE_URL").map(|url| url.trim_end_matches('/').to_string());

        let voting_end = non_empty_var("VOTING_END").and_then(|raw| {
            let parsed = parse_voting_end(&raw);
            if parsed.is_none() {
                tracing::warn!("Ignoring unparsable VOTING_END {:?}", raw);
            }
            parsed
        });

        let templates_dir = env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".into());
        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".into());

        Ok(Self {
            database_url,
            port,
            admin_password,
            session_secret,
            stripe_secret_key,
            stripe_webhook_secret,
            base_url,
            voting_end,
            templates_dir,
            static_dir,
        })
    }
}

/// `YYYY-MM-DD HH:MM` in show-local (Chicago) time, or an RFC 3339 timestamp.
pub fn parse_voting_end(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(end) = DateTime::parse_from_rfc3339(raw) {
        return Some(end);
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").ok()?;
    Chicago
        .from_local_datetime(&naive)
        .earliest()
        .map(|end| end.fixed_offset())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
