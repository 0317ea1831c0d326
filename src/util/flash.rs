//! One-shot messages carried across a redirect in the visitor's session.

use serde::{Deserialize, Serialize};
use tower_sessions::{Session, session::Error};

const FLASH_KEY: &str = "flash.messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

pub async fn push_level(
    session: &Session,
    level: Level,
    message: impl Into<String>,
) -> Result<(), Error> {
    let mut messages: Vec<Flash> = session.get(FLASH_KEY).await?.unwrap_or_default();
    messages.push(Flash {
        level,
        message: message.into(),
    });
    session.insert(FLASH_KEY, messages).await
}

pub async fn error(session: &Session, message: impl Into<String>) -> Result<(), Error> {
    push_level(session, Level::Error, message).await
}

pub async fn ok(session: &Session, message: impl Into<String>) -> Result<(), Error> {
    push_level(session, Level::Ok, message).await
}

/// Returns pending messages and clears them.
pub async fn take(session: &Session) -> Result<Vec<Flash>, Error> {
    Ok(session
        .remove::<Vec<Flash>>(FLASH_KEY)
        .await?
        .unwrap_or_default())
}
