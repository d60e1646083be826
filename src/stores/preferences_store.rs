//! Display preferences: language and theme

use crate::db::{self, keys, KeyValueStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

pub struct PreferencesStore {
    storage: Arc<dyn KeyValueStore>,
    language: RwLock<String>,
    theme: RwLock<Theme>,
}

impl PreferencesStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, default_language: &str) -> Self {
        let language = db::load_raw(storage.as_ref(), keys::LANGUAGE)
            .map(|lang| lang.trim().to_uppercase())
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| default_language.to_uppercase());

        let theme = db::load_raw(storage.as_ref(), keys::THEME)
            .and_then(|raw| match raw.parse::<Theme>() {
                Ok(theme) => Some(theme),
                Err(e) => {
                    warn!("Ignoring stored theme: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        Self {
            storage,
            language: RwLock::new(language),
            theme: RwLock::new(theme),
        }
    }

    pub fn language(&self) -> String {
        self.language.read().clone()
    }

    /// Switch display language; codes are kept upper-case
    pub fn set_language(&self, lang: &str) {
        let normalized = lang.trim().to_uppercase();
        *self.language.write() = normalized.clone();
        db::persist_raw(self.storage.as_ref(), keys::LANGUAGE, &normalized);
        info!(language = %normalized, "Language changed");
    }

    pub fn theme(&self) -> Theme {
        *self.theme.read()
    }

    pub fn set_theme(&self, theme: Theme) {
        *self.theme.write() = theme;
        db::persist_raw(self.storage.as_ref(), keys::THEME, theme.as_str());
        info!(%theme, "Theme changed");
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = self.theme().toggled();
        self.set_theme(theme);
        theme
    }
}
