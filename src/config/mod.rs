/// Database configuration and connection management
pub mod database;

/// Default quest configuration loading from config.toml
pub mod quests;
