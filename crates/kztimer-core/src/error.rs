//! Core error types for kztimer-core.
//!
//! Timer transitions never fail with an error: they report acceptance as a
//! `bool`, and the reason for a refusal is a [`Rejection`]. The remaining
//! types cover configuration and roster management.

use std::path::PathBuf;
use thiserror::Error;

use crate::player::PlayerSlot;

/// Core error type for kztimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Slot does not fit in the roster
    #[error("Player slot {slot} out of range (max {max})")]
    SlotOutOfRange { slot: PlayerSlot, max: usize },

    /// Slot already holds an attached player
    #[error("Player slot {0} is already attached")]
    SlotOccupied(PlayerSlot),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dotted key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No home directory to place the config in
    #[error("Could not determine the configuration directory")]
    NoConfigDir,
}

/// Why a timer transition was refused.
///
/// The `Display` text of the player-facing variants is what gets printed
/// to the actor when an operation is asked to show its error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("Player is not alive")]
    NotAlive,

    #[error("Timer was just started")]
    JustStarted,

    #[error("Player just teleported")]
    JustTeleported,

    #[error("Player just left noclip")]
    JustNoclipped,

    #[error("Invalid move type")]
    InvalidMoveType,

    #[error("Player just landed")]
    JustLanded,

    #[error("Already running course '{0}'")]
    SameCourse(String),

    /// Malformed integration input, logged as a server warning.
    #[error("Mode name is too long ({len} > {max})")]
    ModeNameTooLong { len: usize, max: usize },

    #[error("Already paused")]
    AlreadyPaused,

    #[error("Can't pause, just resumed.")]
    JustResumed,

    #[error("Can't pause while moving in the air.")]
    Airborne,

    #[error("Can't pause, {0}.")]
    PauseRestricted(String),

    #[error("Can't resume, just paused.")]
    JustPaused,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
