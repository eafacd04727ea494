//! Default quest configuration loading from config.toml
//!
//! New child accounts are seeded with a handful of recurring quests so the
//! dashboard is never empty. The list comes from the `[[quests]]` tables of
//! config.toml, with a built-in pair of habits when no file is present.

use crate::errors::{Error, Result};
use crate::models::TaskCategory;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Quests seeded into every new child account
    #[serde(default = "built_in_quests")]
    pub quests: Vec<QuestConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quests: built_in_quests(),
        }
    }
}

/// Configuration for a single seeded quest
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct QuestConfig {
    /// Quest title
    pub title: String,
    /// Optional subtitle shown under the title
    #[serde(default)]
    pub description: Option<String>,
    /// Category spelling, e.g. "Daily Habit"
    pub category: TaskCategory,
    /// Gems granted on approval
    pub reward: i64,
    /// XP granted on approval
    pub xp: i64,
    /// Whether the quest comes back every day
    #[serde(default = "default_recurring")]
    pub is_recurring: bool,
}

const fn default_recurring() -> bool {
    true
}

/// The two habits every new explorer starts with.
#[must_use]
pub fn built_in_quests() -> Vec<QuestConfig> {
    vec![
        QuestConfig {
            title: "Brush Teeth".to_string(),
            description: Some("Morning & Night".to_string()),
            category: TaskCategory::DailyHabit,
            reward: 10,
            xp: 15,
            is_recurring: true,
        },
        QuestConfig {
            title: "Read 10m".to_string(),
            description: Some("Before bed".to_string()),
            category: TaskCategory::Homework,
            reward: 15,
            xp: 20,
            is_recurring: true,
        },
    ]
}

/// Loads quest configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A category is not one of the known spellings
/// - A quest has an empty title or a negative reward or XP
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses and validates config.toml contents.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    for quest in &config.quests {
        quest.validate()?;
    }
    Ok(config)
}

impl QuestConfig {
    /// Applies the same rules a guardian-created quest must meet.
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Config {
                message: "Quest title cannot be empty".to_string(),
            });
        }
        if self.reward < 0 || self.xp < 0 {
            return Err(Error::Config {
                message: format!(
                    "Quest '{}' has a negative reward ({}) or xp ({})",
                    self.title, self.reward, self.xp
                ),
            });
        }
        Ok(())
    }
}

/// Loads ./config.toml, falling back to the built-in quests when it does not exist.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!("No config.toml found, using built-in quests");
        Ok(Config::default())
    }
}
