//! # KZ Timer Core Library
//!
//! Per-player run timer for a movement game mode: start, end, stop,
//! invalidate, pause and resume, with listener vetoes on every transition.
//! The library never talks to a game server directly. The host implements
//! the traits in [`player`] on its player handle and calls the lifecycle
//! hooks from its own event dispatch.
//!
//! ## Architecture
//!
//! - **Timer Service**: one state machine per player, advanced by
//!   `on_tick()` from the physics step
//! - **Listeners**: rule modules (modes, styles, anti-cheat) veto or observe
//!   transitions through a shared [`ListenerRegistry`]
//! - **Roster**: [`PlayerTimers`] maps player slots to their services
//! - **Config**: TOML-based tunables (cooldowns, grace windows, chat prefix)
//!
//! ## Key Components
//!
//! - [`TimerService`]: Core timer state machine
//! - [`TimerSession`]: Per-player timer state
//! - [`TimerConfig`]: Configuration management
//! - [`Event`]: Serializable record of accepted transitions

pub mod config;
pub mod error;
pub mod events;
pub mod player;
pub mod sim;
pub mod timer;

pub use config::TimerConfig;
pub use error::{ConfigError, CoreError, Rejection};
pub use events::{Event, EventRecorder};
pub use player::{
    Actor, Checkpoints, Clock, Feedback, MoveType, Player, PlayerSlot, RuleSet, Team, TimerSound,
};
pub use timer::{
    format_time, ImplicitCause, ListenerRegistry, PauseGuard, PlayerTimers, RunResult,
    TimerEventListener, TimerService, TimerSession,
};
