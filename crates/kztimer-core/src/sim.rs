//! In-memory host for replaying scenarios without a game server.
//!
//! [`SimClock`] is a manually advanced server clock and [`SimPlayer`] a
//! player handle that records every sound and chat line the timer produces.
//! [`VetoListener`] refuses a configurable set of transitions.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::player::{
    Actor, Checkpoints, Clock, CollisionGroup, Feedback, MoveType, PlayerSlot, RuleSet,
    TimerSound, Vec3,
};
use crate::timer::{RunResult, TimerEventListener};

/// Tick interval of a 64 tick server.
pub const TICK_INTERVAL_64: f64 = 1.0 / 64.0;

/// Manually driven server clock.
#[derive(Debug)]
pub struct SimClock {
    now: Cell<f64>,
    tick_interval: f64,
}

impl SimClock {
    pub fn new(tick_interval: f64) -> Self {
        Self {
            now: Cell::new(0.0),
            tick_interval,
        }
    }

    /// Start the clock at a given server time.
    pub fn starting_at(now: f64, tick_interval: f64) -> Self {
        Self {
            now: Cell::new(now),
            tick_interval,
        }
    }

    /// Move forward one tick.
    pub fn tick(&self) {
        self.advance(self.tick_interval);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(TICK_INTERVAL_64)
    }
}

impl Clock for SimClock {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn tick_interval(&self) -> f64 {
        self.tick_interval
    }
}

/// Player handle with plain fields for every movement query.
#[derive(Debug, Clone, Serialize)]
pub struct SimPlayer {
    pub slot: PlayerSlot,
    pub name: String,
    pub alive: bool,
    pub bot: bool,
    pub move_type: MoveType,
    pub velocity: Vec3,
    pub grounded: bool,
    pub landing_time: Option<f64>,
    pub collision_group: CollisionGroup,
    pub duck_amount: f32,
    pub stamina: f32,
    pub teleport_count: u32,
    pub last_noclip_time: Option<f64>,
    pub mode_name: String,
    pub mode_short_name: String,
    pub style_short_name: String,

    /// Sounds played to this player, oldest first.
    pub sounds: Vec<TimerSound>,
    pub error_sounds: u32,
    /// Private chat lines.
    pub chat: Vec<String>,
    /// Server-wide broadcasts sent through this player.
    pub broadcasts: Vec<String>,
}

impl SimPlayer {
    /// Alive, grounded and standing still, in the classic mode.
    pub fn new(slot: u32, name: &str) -> Self {
        Self {
            slot: PlayerSlot(slot),
            name: name.to_string(),
            alive: true,
            bot: false,
            move_type: MoveType::Walk,
            velocity: Vec3::ZERO,
            grounded: true,
            landing_time: None,
            collision_group: CollisionGroup::Standard,
            duck_amount: 0.0,
            stamina: 0.0,
            teleport_count: 0,
            last_noclip_time: None,
            mode_name: "Classic".into(),
            mode_short_name: "CKZ".into(),
            style_short_name: "NRM".into(),
            sounds: Vec::new(),
            error_sounds: 0,
            chat: Vec::new(),
            broadcasts: Vec::new(),
        }
    }

    pub fn bot(slot: u32, name: &str) -> Self {
        Self {
            bot: true,
            ..Self::new(slot, name)
        }
    }
}

impl Actor for SimPlayer {
    fn slot(&self) -> PlayerSlot {
        self.slot
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn is_bot(&self) -> bool {
        self.bot
    }

    fn move_type(&self) -> MoveType {
        self.move_type
    }

    fn set_move_type(&mut self, move_type: MoveType) {
        self.move_type = move_type;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn landing_time(&self) -> Option<f64> {
        self.landing_time
    }

    fn set_collision_group(&mut self, group: CollisionGroup) {
        self.collision_group = group;
    }

    fn duck_amount(&self) -> f32 {
        self.duck_amount
    }

    fn set_duck_amount(&mut self, amount: f32) {
        self.duck_amount = amount;
    }

    fn stamina(&self) -> f32 {
        self.stamina
    }

    fn set_stamina(&mut self, stamina: f32) {
        self.stamina = stamina;
    }
}

impl Checkpoints for SimPlayer {
    fn teleport_count(&self) -> u32 {
        self.teleport_count
    }

    fn last_noclip_time(&self) -> Option<f64> {
        self.last_noclip_time
    }
}

impl RuleSet for SimPlayer {
    fn mode_name(&self) -> &str {
        &self.mode_name
    }

    fn mode_short_name(&self) -> &str {
        &self.mode_short_name
    }

    fn style_short_name(&self) -> &str {
        &self.style_short_name
    }
}

impl Feedback for SimPlayer {
    fn play_sound(&mut self, sound: TimerSound) {
        self.sounds.push(sound);
    }

    fn play_error_sound(&mut self) {
        self.error_sounds += 1;
    }

    fn print_chat(&mut self, message: &str) {
        self.chat.push(message.to_string());
    }

    fn print_chat_all(&mut self, message: &str) {
        self.broadcasts.push(message.to_string());
    }
}

/// Transitions a [`VetoListener`] can refuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Start,
    End,
    EndMessage,
    Pause,
    Resume,
}

/// Listener that refuses the configured transitions, optionally only for
/// one player, and counts how often it was asked.
#[derive(Debug, Default)]
pub struct VetoListener {
    refuse: RefCell<HashSet<Transition>>,
    only_slot: Option<PlayerSlot>,
    asked: Cell<u32>,
}

impl VetoListener {
    pub fn refusing(transitions: &[Transition]) -> Self {
        Self {
            refuse: RefCell::new(transitions.iter().copied().collect()),
            ..Default::default()
        }
    }

    pub fn for_slot(mut self, slot: PlayerSlot) -> Self {
        self.only_slot = Some(slot);
        self
    }

    /// Stop refusing a transition.
    pub fn allow(&self, transition: Transition) {
        self.refuse.borrow_mut().remove(&transition);
    }

    /// Number of veto hooks this listener answered.
    pub fn asked(&self) -> u32 {
        self.asked.get()
    }

    fn answer(&self, player: &dyn Actor, transition: Transition) -> bool {
        self.asked.set(self.asked.get() + 1);
        let applies = self.only_slot.map_or(true, |slot| slot == player.slot());
        !(applies && self.refuse.borrow().contains(&transition))
    }
}

impl TimerEventListener for VetoListener {
    fn on_timer_start(&self, player: &dyn Actor, _course: &str) -> bool {
        self.answer(player, Transition::Start)
    }

    fn on_timer_end(&self, player: &dyn Actor, _run: &RunResult) -> bool {
        self.answer(player, Transition::End)
    }

    fn on_timer_end_message(&self, player: &dyn Actor, _run: &RunResult) -> bool {
        self.answer(player, Transition::EndMessage)
    }

    fn on_pause(&self, player: &dyn Actor) -> bool {
        self.answer(player, Transition::Pause)
    }

    fn on_resume(&self, player: &dyn Actor) -> bool {
        self.answer(player, Transition::Resume)
    }
}
