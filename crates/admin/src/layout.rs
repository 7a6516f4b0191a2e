//! Data shared by every page rendered inside `base.html`.

use tower_sessions::Session;

use crate::flash::{self, Flash};

/// Navigation entries: `(path, label)`.
pub const NAV: [(&str, &str); 3] = [
    ("/products", "Produkter"),
    ("/categories", "Kategorier"),
    ("/maintenance", "Underhåll"),
];

/// Page chrome: title, active nav entry, and queued messages.
#[derive(Debug, Clone)]
pub struct Layout {
    pub title: String,
    pub current_path: String,
    pub flashes: Vec<Flash>,
}

impl Layout {
    /// Collect the layout for a page, consuming queued flashes.
    pub async fn build(session: &Session, title: impl Into<String>, current_path: &str) -> Self {
        Self {
            title: title.into(),
            current_path: current_path.to_string(),
            flashes: flash::take(session).await,
        }
    }

    /// Whether a nav entry is the current section.
    #[must_use]
    pub fn is_active(&self, path: &str) -> bool {
        self.current_path == path || self.current_path.starts_with(&format!("{path}/"))
    }

    #[must_use]
    pub const fn nav(&self) -> &'static [(&'static str, &'static str)] {
        &NAV
    }
}
