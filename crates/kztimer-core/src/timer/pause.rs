//! Pause / resume sub-machine.
//!
//! A pause freezes the player in place and stops the clock. Pausing is only
//! allowed while standing on the ground (or with no run active), and a
//! cooldown separates a pause from the resume that follows it, and a resume
//! from the next pause.
//!
//! Besides the player-requested `pause` / `resume`, external events can move
//! a player in or out of the paused state. Those go through
//! [`TimerService::force_pause`] and [`TimerService::force_resume`], which skip
//! guards and vetoes.

use super::service::TimerService;
use super::session::{within, MovementSnapshot, TimerSession};
use crate::error::Rejection;
use crate::player::{Actor, CollisionGroup, MoveType, Player, Vec3};

/// Extra condition checked before a player may pause during a run.
///
/// Nothing is installed by default; anti-bhop or anti-pause-abuse modules
/// plug in here.
pub trait PauseGuard {
    /// `Err` carries the reason shown to the player.
    fn check(&self, player: &dyn Actor, session: &TimerSession, now: f64) -> Result<(), String>;
}

/// Why a pause state changed without the player asking for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplicitCause {
    /// Something moved the player out of the frozen move type.
    MoveTypeChanged,
    Respawned,
    JoinedSpectators,
}

impl<P: Player> TimerService<P> {
    /// Whether a pause would be allowed right now, printing the reason to the
    /// player if not and `show_error` is set.
    pub fn can_pause(&mut self, show_error: bool) -> bool {
        match self.check_pause() {
            Ok(()) => true,
            Err(Rejection::AlreadyPaused) => false,
            Err(rejection) => {
                tracing::debug!("Pause rejected for slot {}: {}", self.player.slot(), rejection);
                if show_error {
                    self.show_rejection(&rejection.to_string());
                }
                false
            }
        }
    }

    /// Freeze the player and stop the clock.
    pub fn pause(&mut self) -> bool {
        if !self.can_pause(true) {
            return false;
        }

        let player: &dyn Actor = &self.player;
        if !self.listeners.poll(|l| l.on_pause(player)) {
            tracing::debug!("Pause vetoed for slot {}", self.player.slot());
            self.show_rejection("Can't pause right now.");
            return false;
        }

        self.session.pause_snapshot = Some(MovementSnapshot {
            on_ladder: self.player.move_type() == MoveType::Ladder,
            duck_amount: self.player.duck_amount(),
            stamina: self.player.stamina(),
        });
        self.player.set_velocity(Vec3::ZERO);
        self.player.set_move_type(MoveType::None);
        self.session.mark_paused(self.clock.now());

        let player: &dyn Actor = &self.player;
        self.listeners.notify(|l| l.on_pause_post(player));
        true
    }

    /// Whether a resume would be allowed right now.
    pub fn can_resume(&mut self, show_error: bool) -> bool {
        match self.check_resume() {
            Ok(()) => true,
            Err(rejection) => {
                tracing::debug!("Resume rejected for slot {}: {}", self.player.slot(), rejection);
                if show_error {
                    self.show_rejection(&rejection.to_string());
                }
                false
            }
        }
    }

    /// Unfreeze the player. `force` skips the resume cooldown, not the
    /// listeners.
    pub fn resume(&mut self, force: bool) -> bool {
        if !self.session.paused {
            return false;
        }
        if !force && !self.can_resume(true) {
            return false;
        }

        let player: &dyn Actor = &self.player;
        if !self.listeners.poll(|l| l.on_resume(player)) {
            tracing::debug!("Resume vetoed for slot {}", self.player.slot());
            self.show_rejection("Can't resume right now.");
            return false;
        }

        let snapshot = self.session.pause_snapshot.take();
        let on_ladder = snapshot.is_some_and(|s| s.on_ladder);
        self.player
            .set_move_type(if on_ladder { MoveType::Ladder } else { MoveType::Walk });
        // Leaving the pause must not keep a noclip collision group around.
        self.player.set_collision_group(CollisionGroup::Standard);
        self.session.mark_resumed(self.clock.now());
        self.restore_movement(snapshot);

        let player: &dyn Actor = &self.player;
        self.listeners.notify(|l| l.on_resume_post(player));
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.session.paused {
            self.resume(false)
        } else {
            self.pause()
        }
    }

    /// Enter the paused state without guards or vetoes. No-op when already
    /// paused.
    pub fn force_pause(&mut self, cause: ImplicitCause) -> bool {
        if self.session.paused {
            return false;
        }
        self.session.mark_paused(self.clock.now());
        tracing::debug!("Slot {} paused implicitly ({:?})", self.player.slot(), cause);

        let player: &dyn Actor = &self.player;
        self.listeners.notify(|l| l.on_pause_post(player));
        true
    }

    /// Leave the paused state without guards or vetoes. The move type is
    /// left alone: whatever ended the pause already set it.
    pub fn force_resume(&mut self, cause: ImplicitCause) -> bool {
        if !self.session.paused {
            return false;
        }
        let snapshot = self.session.pause_snapshot.take();
        self.session.mark_resumed(self.clock.now());
        self.restore_movement(snapshot);
        tracing::debug!("Slot {} resumed implicitly ({:?})", self.player.slot(), cause);

        let player: &dyn Actor = &self.player;
        self.listeners.notify(|l| l.on_resume_post(player));
        true
    }

    // ── Guards ───────────────────────────────────────────────────────

    fn check_pause(&self) -> Result<(), Rejection> {
        if self.session.paused {
            return Err(Rejection::AlreadyPaused);
        }
        if !self.session.running {
            return Ok(());
        }

        let now = self.clock.now();
        if self.session.has_resumed_in_run
            && within(self.session.last_resume_time, now, self.config.pause_cooldown)
        {
            return Err(Rejection::JustResumed);
        }
        if !self.player.is_grounded() && !self.player.velocity().is_stationary() {
            return Err(Rejection::Airborne);
        }
        for guard in &self.pause_guards {
            guard
                .check(&self.player, &self.session, now)
                .map_err(Rejection::PauseRestricted)?;
        }
        Ok(())
    }

    fn check_resume(&self) -> Result<(), Rejection> {
        let now = self.clock.now();
        if self.session.running
            && self.session.has_paused_in_run
            && within(self.session.last_pause_time, now, self.config.pause_cooldown)
        {
            return Err(Rejection::JustPaused);
        }
        Ok(())
    }

    fn restore_movement(&mut self, snapshot: Option<MovementSnapshot>) {
        if let Some(snapshot) = snapshot {
            self.player.set_duck_amount(snapshot.duck_amount);
            self.player.set_stamina(snapshot.stamina);
        }
    }
}
