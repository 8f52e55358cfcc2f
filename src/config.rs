use std::path::Path;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::Result;

/// The one persisted preference, written beside the binary like the rest of
/// our working files.
pub const CONFIG_PATH: &str = "paydash.config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Dark => Palette {
                accent: Color::Yellow,
                text: Color::White,
                muted: Color::DarkGray,
                positive: Color::Green,
                negative: Color::Red,
                badge_bg: Color::Blue,
                overlay_bg: Color::DarkGray,
            },
            Self::Light => Palette {
                accent: Color::Blue,
                text: Color::Black,
                muted: Color::Gray,
                positive: Color::Green,
                negative: Color::Red,
                badge_bg: Color::Cyan,
                overlay_bg: Color::Gray,
            },
        }
    }
}

/// Colors every draw function pulls from instead of naming them inline.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub positive: Color,
    pub negative: Color,
    pub badge_bg: Color,
    pub overlay_bg: Color,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UiConfig {
    pub theme: Theme,
}

impl UiConfig {
    /// Missing file means first run; a malformed one is ignored with a
    /// diagnostic rather than blocking startup.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("ignoring malformed {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_preference_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_PATH);

        let config = UiConfig { theme: Theme::Light };
        config.save(&path).unwrap();

        let reloaded = UiConfig::load(&path);
        assert_eq!(reloaded.theme, Theme::Light);
    }

    #[test]
    fn missing_file_falls_back_to_the_default_theme() {
        let dir = tempfile::tempdir().unwrap();
        let config = UiConfig::load(&dir.path().join("nope.json"));
        assert_eq!(config.theme, Theme::Dark);
    }

    #[test]
    fn malformed_file_falls_back_to_the_default_theme() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_PATH);
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(UiConfig::load(&path).theme, Theme::Dark);
    }

    #[test]
    fn themes_serialize_as_lowercase_strings() {
        let raw = serde_json::to_string(&UiConfig { theme: Theme::Dark }).unwrap();
        assert!(raw.contains("\"dark\""));
    }
}
