//! Arcade Sim - fixed-tick simulation core for three arcade games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (shooter, tower defense, territory capture)
//! - `geom`: Distance and direction helpers
//! - `config`: Data-driven game balance
//! - `persistence`: Key-value storage with JSON values
//! - `highscores`: Per-game leaderboards

pub mod config;
pub mod geom;
pub mod highscores;
pub mod persistence;
pub mod sim;

pub use config::{DefenseConfig, LevelConfig, ShooterConfig, TerritoryConfig};
pub use geom::Playfield;
pub use highscores::HighScores;

/// Crate-wide constants
pub mod consts {
    /// Default playfield size (portrait phone, logical pixels)
    pub const FIELD_WIDTH: f32 = 390.0;
    pub const FIELD_HEIGHT: f32 = 844.0;

    /// Maximum firings per clock per advance to prevent spiral of death
    pub const MAX_CATCH_UP: u32 = 8;
}
