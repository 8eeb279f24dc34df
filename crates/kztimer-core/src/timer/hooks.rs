//! Lifecycle hooks called by the host's event dispatch.

use super::pause::ImplicitCause;
use super::service::TimerService;
use crate::player::{MoveType, Player, Team};

impl<P: Player> TimerService<P> {
    /// Physics step finished. The only place run time accrues.
    pub fn on_tick(&mut self) {
        if self.player.is_alive() && self.session.running && !self.session.paused {
            self.session.current_time += self.clock.tick_interval();
        }
    }

    /// The pawn's move type changed. A paused player that is no longer
    /// frozen has escaped the pause.
    pub fn on_move_type_changed(&mut self, old: MoveType) {
        if !self.session.paused || self.player.move_type() == MoveType::None {
            return;
        }
        tracing::debug!(
            "Slot {} left the frozen move type ({:?} -> {:?})",
            self.player.slot(),
            old,
            self.player.move_type()
        );
        self.force_resume(ImplicitCause::MoveTypeChanged);
    }

    pub fn on_teleport(&mut self) {
        self.session.last_teleport_time = Some(self.clock.now());
    }

    pub fn on_teleport_to_start(&mut self) {
        self.stop_run(true);
    }

    /// Player is leaving the server: stop the run and forget everything.
    pub fn on_disconnect(&mut self) {
        self.stop_run(false);
        self.session.reset();
    }

    pub fn on_spawn(&mut self) {
        if self.session.paused {
            self.force_resume(ImplicitCause::Respawned);
        }
    }

    pub fn on_team_changed(&mut self, team: Team) {
        if team == Team::Spectator {
            self.force_pause(ImplicitCause::JoinedSpectators);
        }
    }

    pub fn on_death(&mut self) {
        self.stop_run(true);
    }

    /// New round: the run is already stopped by the roster, wipe the rest.
    pub(crate) fn on_round_reset(&mut self) {
        self.session.reset();
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Body of the stop-timer chat command.
    pub fn command_stop(&mut self) -> bool {
        self.session.running && self.stop_run(true)
    }

    /// Body of the pause chat command.
    pub fn command_pause(&mut self) -> bool {
        self.toggle_pause()
    }
}
