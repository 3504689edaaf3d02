//! One-shot flash messages carried in the session.
//!
//! A handler queues a message before redirecting; the next rendered page
//! takes the queue and shows it once.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Visual category of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    /// CSS class suffix used by the base template.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A queued message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Queue a message for the next rendered page.
///
/// Session failures are logged and otherwise ignored; losing a flash message
/// must not fail the request that produced it.
pub async fn push_flash(session: &Session, level: FlashLevel, message: impl Into<String>) {
    let mut queue = match session.get::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(queue) => queue.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash queue");
            Vec::new()
        }
    };
    queue.push(Flash {
        level,
        message: message.into(),
    });

    if let Err(e) = session.insert(session_keys::FLASH, queue).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take and clear all queued messages.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(queue) => queue.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to take flash messages");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flashes_are_taken_once_in_order() {
        let session = session();
        push_flash(&session, FlashLevel::Success, "first").await;
        push_flash(&session, FlashLevel::Error, "second").await;

        let taken = take_flashes(&session).await;
        let messages: Vec<_> = taken.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
        assert_eq!(taken[1].level, FlashLevel::Error);

        assert!(take_flashes(&session).await.is_empty());
    }
}
