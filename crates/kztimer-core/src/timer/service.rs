//! Timer service implementation.
//!
//! One `TimerService` exists per connected player. It owns the player's
//! [`TimerSession`] and handle, and is driven entirely by the host: game
//! events call the lifecycle hooks, the physics step calls `on_tick()`.
//! There are no internal threads and nothing is scheduled.
//!
//! ## State Transitions
//!
//! ```text
//!            start_run                 end_run / stop_run
//! Stopped ─────────────▶ Running ───────────────────────▶ Stopped
//!    │  ▲                  │  ▲
//!    │  │ resume           │  │ resume
//!    ▼  │                  ▼  │
//! Stopped+Paused        Running+Paused  (time frozen)
//! ```
//!
//! Every transition first checks its guards, then asks the listeners, and
//! only then writes to the session. A refused transition changes nothing.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = TimerService::new(player, listeners, clock, config);
//! timer.start_run("", true);
//! // Every physics step:
//! timer.on_tick();
//! ```

use std::rc::Rc;

use super::format;
use super::listener::{ListenerRegistry, RunResult};
use super::pause::PauseGuard;
use super::session::{within, TimerSession};
use crate::config::TimerConfig;
use crate::error::Rejection;
use crate::player::{Actor, Clock, Player, TimerSound};

/// A start less than this long ago happened in the same server instant.
const JUST_STARTED_EPSILON: f64 = 1e-6;

/// Timer state machine for one player.
pub struct TimerService<P> {
    pub(crate) player: P,
    pub(crate) session: TimerSession,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) clock: Rc<dyn Clock>,
    pub(crate) config: Rc<TimerConfig>,
    pub(crate) pause_guards: Vec<Rc<dyn PauseGuard>>,
}

impl<P: Player> TimerService<P> {
    pub fn new(
        player: P,
        listeners: ListenerRegistry,
        clock: Rc<dyn Clock>,
        config: Rc<TimerConfig>,
    ) -> Self {
        Self {
            player,
            session: TimerSession::new(),
            listeners,
            clock,
            config,
            pause_guards: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Mutable access to the player handle, for hosts that feed movement
    /// changes through it before calling the matching hook.
    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.session.running
    }

    pub fn is_paused(&self) -> bool {
        self.session.paused
    }

    pub fn current_time(&self) -> f64 {
        self.session.current_time
    }

    /// Install an extra pause guard, checked while a run is active.
    pub fn add_pause_guard(&mut self, guard: Rc<dyn PauseGuard>) {
        self.pause_guards.push(guard);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start timing `course` (empty for the main course).
    ///
    /// Restarting the course that is already running is refused; starting a
    /// different course while running restarts the clock for that course.
    pub fn start_run(&mut self, course: &str, play_sound: bool) -> bool {
        let course = self.bounded_course(course);
        if let Err(rejection) = self.check_start(&course) {
            match rejection {
                Rejection::ModeNameTooLong { .. } => {
                    tracing::warn!(
                        "[KZ] Timer start failed for slot {}: {}",
                        self.player.slot(),
                        rejection
                    );
                }
                _ => {
                    tracing::debug!(
                        "Timer start rejected for slot {}: {}",
                        self.player.slot(),
                        rejection
                    );
                }
            }
            return false;
        }

        let player: &dyn Actor = &self.player;
        if !self.listeners.poll(|l| l.on_timer_start(player, &course)) {
            tracing::debug!("Timer start vetoed for slot {}", self.player.slot());
            return false;
        }

        let mode = self.player.mode_name().to_string();
        self.session.begin_run(course.clone(), mode, self.clock.now());
        if play_sound {
            self.play_start_sound();
        }
        tracing::debug!("Timer started for slot {} on course '{}'", self.player.slot(), course);

        let player: &dyn Actor = &self.player;
        self.listeners.notify(|l| l.on_timer_start_post(player, &course));
        true
    }

    /// Finish the run on `course`.
    ///
    /// Ending without a matching run is a false end: the false end sound
    /// plays and the attempt is timestamped so rule modules can see it.
    pub fn end_run(&mut self, course: &str) -> bool {
        if !self.player.is_alive() {
            return false;
        }

        let course = self.bounded_course(course);
        let now = self.clock.now();
        if !self.session.running || !self.session.current_course.eq_ignore_ascii_case(&course) {
            self.player.play_sound(TimerSound::FalseEnd);
            self.session.last_false_end_time = Some(now);
            tracing::debug!(
                "False timer end for slot {} on course '{}'",
                self.player.slot(),
                course
            );
            return false;
        }

        // The tick that triggered the end has not been integrated yet.
        let run = RunResult {
            course: self.session.current_course.clone(),
            time: self.session.current_time + self.clock.tick_interval(),
            teleports_used: self.player.teleport_count(),
        };

        let player: &dyn Actor = &self.player;
        if !self.listeners.poll(|l| l.on_timer_end(player, &run)) {
            tracing::debug!("Timer end vetoed for slot {}", self.player.slot());
            return false;
        }

        self.session.running = false;
        self.session.last_end_time = Some(now);
        self.player.play_sound(TimerSound::End);

        if !self.player.is_bot() {
            let player: &dyn Actor = &self.player;
            if self.listeners.poll(|l| l.on_timer_end_message(player, &run)) {
                let message = format::end_message(
                    &self.config.chat_prefix,
                    self.player.name(),
                    &run,
                    self.player.mode_short_name(),
                    self.player.style_short_name(),
                );
                self.player.print_chat_all(&message);
            }
        }
        tracing::debug!("Timer ended for slot {} in {:.3}s", self.player.slot(), run.time);

        let player: &dyn Actor = &self.player;
        self.listeners.notify(|l| l.on_timer_end_post(player, &run));
        true
    }

    /// Abandon the active run. Never vetoed.
    pub fn stop_run(&mut self, play_sound: bool) -> bool {
        if !self.session.running {
            return false;
        }
        self.session.running = false;
        if play_sound {
            self.player.play_sound(TimerSound::Stop);
        }
        tracing::debug!("Timer stopped for slot {}", self.player.slot());

        let player: &dyn Actor = &self.player;
        self.listeners.notify(|l| l.on_timer_stopped(player));
        true
    }

    /// Mark the current run as not eligible for records. Only the first
    /// call per run notifies listeners.
    pub fn invalidate_run(&mut self) -> bool {
        if !self.session.valid_time {
            return false;
        }
        self.session.valid_time = false;
        tracing::debug!("Run invalidated for slot {}", self.player.slot());

        let player: &dyn Actor = &self.player;
        self.listeners.notify(|l| l.on_timer_invalidated(player));
        true
    }

    // ── Guards ───────────────────────────────────────────────────────

    fn check_start(&self, course: &str) -> Result<(), Rejection> {
        let now = self.clock.now();
        let config = &self.config;

        if !self.player.is_alive() {
            return Err(Rejection::NotAlive);
        }
        if self.just_started_timer() {
            return Err(Rejection::JustStarted);
        }
        if within(self.session.last_teleport_time, now, config.min_ground_time) {
            return Err(Rejection::JustTeleported);
        }
        if within(self.player.last_noclip_time(), now, config.noclip_grace_time) {
            return Err(Rejection::JustNoclipped);
        }
        if !self.player.move_type().allows_timer_start() {
            return Err(Rejection::InvalidMoveType);
        }
        if within(self.player.landing_time(), now, config.min_ground_time) {
            return Err(Rejection::JustLanded);
        }
        if self.session.running && self.session.current_course.eq_ignore_ascii_case(course) {
            return Err(Rejection::SameCourse(course.to_string()));
        }

        let len = self.player.mode_name().chars().count();
        if len > config.max_mode_name_length {
            return Err(Rejection::ModeNameTooLong {
                len,
                max: config.max_mode_name_length,
            });
        }
        Ok(())
    }

    /// Guards against a second start within the same instant.
    fn just_started_timer(&self) -> bool {
        self.session.running
            && within(self.session.last_start_time, self.clock.now(), JUST_STARTED_EPSILON)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn bounded_course(&self, course: &str) -> String {
        course.chars().take(self.config.max_course_name_length).collect()
    }

    fn play_start_sound(&mut self) {
        let now = self.clock.now();
        if within(self.session.last_start_sound_time, now, self.config.sound_cooldown) {
            return;
        }
        self.player.play_sound(TimerSound::Start);
        self.session.last_start_sound_time = Some(now);
    }

    /// Send a rejection to the player together with the error sound.
    pub(crate) fn show_rejection(&mut self, reason: &str) {
        let message = format!("{} {{grey}}{}", self.config.chat_prefix, reason);
        self.player.print_chat(&message);
        self.player.play_error_sound();
    }
}

impl<P: Player + std::fmt::Debug> std::fmt::Debug for TimerService<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerService")
            .field("player", &self.player)
            .field("session", &self.session)
            .field("listeners", &self.listeners)
            .finish()
    }
}
