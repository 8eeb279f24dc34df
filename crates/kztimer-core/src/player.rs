//! Host-side collaborators the timer talks to.
//!
//! The timer never simulates movement, plays audio or prints text itself.
//! The game server implements these traits on its player handle and the
//! timer drives them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest player slot a server hands out.
pub const MAX_PLAYERS: usize = 64;

/// Server-side player slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerSlot(pub u32);

impl PlayerSlot {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Movement mode of a player pawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveType {
    /// Frozen: no simulation at all. Pausing puts players here.
    None,
    #[default]
    Walk,
    Ladder,
    Noclip,
    Observer,
}

impl MoveType {
    /// Move types a run may be started from.
    pub fn allows_timer_start(self) -> bool {
        matches!(self, MoveType::Walk | MoveType::Ladder)
    }
}

/// Collision group applied to the pawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionGroup {
    #[default]
    Standard,
    Debris,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Unassigned,
    Spectator,
    Terrorist,
    CounterTerrorist,
}

/// Sounds the timer asks the host to play to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerSound {
    Start,
    End,
    FalseEnd,
    Stop,
}

impl TimerSound {
    /// Sound event name for the host's sound system.
    pub fn asset(self) -> &'static str {
        match self {
            TimerSound::Start => "kz.timer.start",
            TimerSound::End => "kz.timer.end",
            TimerSound::FalseEnd => "kz.timer.false_end",
            TimerSound::Stop => "kz.timer.stop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length_2d(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// True when there is neither horizontal nor vertical motion.
    pub fn is_stationary(&self) -> bool {
        self.length_2d() == 0.0 && self.z == 0.0
    }
}

/// Server clock: current server time and the fixed simulation step, both in seconds.
pub trait Clock {
    fn now(&self) -> f64;

    fn tick_interval(&self) -> f64;
}

/// Movement and capability queries on a player's pawn.
pub trait Actor {
    fn slot(&self) -> PlayerSlot;

    fn name(&self) -> &str;

    fn is_alive(&self) -> bool;

    fn is_bot(&self) -> bool;

    fn move_type(&self) -> MoveType;

    fn set_move_type(&mut self, move_type: MoveType);

    fn velocity(&self) -> Vec3;

    fn set_velocity(&mut self, velocity: Vec3);

    fn is_grounded(&self) -> bool;

    /// Server time of the last landing, if the player ever landed.
    fn landing_time(&self) -> Option<f64>;

    fn set_collision_group(&mut self, group: CollisionGroup);

    fn duck_amount(&self) -> f32;

    fn set_duck_amount(&mut self, amount: f32);

    fn stamina(&self) -> f32;

    fn set_stamina(&mut self, stamina: f32);
}

/// Checkpoint and noclip bookkeeping owned by other services.
pub trait Checkpoints {
    /// Checkpoint teleports used in the current run.
    fn teleport_count(&self) -> u32;

    /// Server time the player last left noclip.
    fn last_noclip_time(&self) -> Option<f64>;
}

/// Active mode and style of the player.
pub trait RuleSet {
    fn mode_name(&self) -> &str;

    fn mode_short_name(&self) -> &str;

    fn style_short_name(&self) -> &str;
}

/// Audio and chat output towards players.
pub trait Feedback {
    fn play_sound(&mut self, sound: TimerSound);

    fn play_error_sound(&mut self);

    /// Message to this player only.
    fn print_chat(&mut self, message: &str);

    /// Message to every player on the server.
    fn print_chat_all(&mut self, message: &str);
}

/// Everything the timer needs from a player handle.
pub trait Player: Actor + Checkpoints + RuleSet + Feedback {}

impl<T: Actor + Checkpoints + RuleSet + Feedback> Player for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_walk_and_ladder_start_runs() {
        assert!(MoveType::Walk.allows_timer_start());
        assert!(MoveType::Ladder.allows_timer_start());
        assert!(!MoveType::None.allows_timer_start());
        assert!(!MoveType::Noclip.allows_timer_start());
        assert!(!MoveType::Observer.allows_timer_start());
    }

    #[test]
    fn stationary_needs_zero_vertical_speed() {
        assert!(Vec3::ZERO.is_stationary());
        assert!(!Vec3::new(0.0, 0.0, -4.0).is_stationary());
        assert!(!Vec3::new(3.0, 4.0, 0.0).is_stationary());
        assert_eq!(Vec3::new(3.0, 4.0, 0.0).length_2d(), 5.0);
    }

    #[test]
    fn sound_assets_are_distinct() {
        let sounds = [TimerSound::Start, TimerSound::End, TimerSound::FalseEnd, TimerSound::Stop];
        let mut assets: Vec<_> = sounds.iter().map(|s| s.asset()).collect();
        assets.dedup();
        assert_eq!(assets.len(), 4);
        assert_eq!(TimerSound::FalseEnd.asset(), "kz.timer.false_end");
    }
}
