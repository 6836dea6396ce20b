/// Database configuration and connection management
pub mod database;

/// Party and medicine seed data loaded from config.toml
pub mod seed;
