//! One-shot messages shown on the next rendered page.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

/// A message queued in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    /// CSS modifier for the toast.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "toast-success",
            FlashLevel::Info => "toast-info",
            FlashLevel::Error => "toast-error",
        }
    }

    /// ARIA role: errors interrupt, everything else is polite.
    #[must_use]
    pub const fn role(&self) -> &'static str {
        match self.level {
            FlashLevel::Error => "alert",
            FlashLevel::Success | FlashLevel::Info => "status",
        }
    }
}

/// Queue a message for the next page.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn push(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    let mut queued: Vec<Flash> = session
        .get(session_keys::FLASH)
        .await?
        .unwrap_or_default();
    queued.push(flash);
    session.insert(session_keys::FLASH, queued).await
}

/// Remove and return every queued message.
///
/// Messages are lost rather than shown twice if the store fails.
pub async fn take(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(queued) => queued.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read flash messages: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flashes_are_shown_once_in_order() {
        let session = session();
        push(&session, Flash::success("Tillagd")).await.unwrap();
        push(&session, Flash::error("Slut i lager")).await.unwrap();

        let shown = take(&session).await;
        assert_eq!(shown, vec![Flash::success("Tillagd"), Flash::error("Slut i lager")]);
        assert!(take(&session).await.is_empty());
    }

    #[test]
    fn test_roles() {
        assert_eq!(Flash::error("x").role(), "alert");
        assert_eq!(Flash::info("x").role(), "status");
        assert_eq!(Flash::success("x").css_class(), "toast-success");
    }
}
