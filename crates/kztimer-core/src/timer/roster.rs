//! Slot-indexed table of timer services.

use std::rc::Rc;

use super::listener::ListenerRegistry;
use super::pause::PauseGuard;
use super::service::TimerService;
use crate::config::TimerConfig;
use crate::error::{CoreError, Result};
use crate::player::{Clock, Player, PlayerSlot, MAX_PLAYERS};

/// One [`TimerService`] per connected player, all sharing the same listener
/// registry, clock, configuration and pause guards.
pub struct PlayerTimers<P> {
    slots: Vec<Option<TimerService<P>>>,
    listeners: ListenerRegistry,
    clock: Rc<dyn Clock>,
    config: Rc<TimerConfig>,
    pause_guards: Vec<Rc<dyn PauseGuard>>,
}

impl<P: Player> PlayerTimers<P> {
    pub fn new(clock: Rc<dyn Clock>, config: TimerConfig) -> Self {
        Self::with_listeners(ListenerRegistry::new(), clock, config)
    }

    /// Build a roster around an existing registry.
    pub fn with_listeners(
        listeners: ListenerRegistry,
        clock: Rc<dyn Clock>,
        config: TimerConfig,
    ) -> Self {
        Self {
            slots: (0..=MAX_PLAYERS).map(|_| None).collect(),
            listeners,
            clock,
            config: Rc::new(config),
            pause_guards: Vec::new(),
        }
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Create a timer for a newly connected player.
    pub fn attach(&mut self, player: P) -> Result<&mut TimerService<P>> {
        let slot = player.slot();
        let entry = self.slots.get_mut(slot.index()).ok_or(CoreError::SlotOutOfRange {
            slot,
            max: MAX_PLAYERS,
        })?;
        if entry.is_some() {
            return Err(CoreError::SlotOccupied(slot));
        }

        let mut service = TimerService::new(
            player,
            self.listeners.clone(),
            Rc::clone(&self.clock),
            Rc::clone(&self.config),
        );
        for guard in &self.pause_guards {
            service.add_pause_guard(Rc::clone(guard));
        }
        tracing::debug!("Attached timer for slot {}", slot);
        Ok(entry.insert(service))
    }

    /// Remove a player's timer, running the disconnect hook first.
    pub fn detach(&mut self, slot: PlayerSlot) -> Option<TimerService<P>> {
        let mut service = self.slots.get_mut(slot.index())?.take()?;
        service.on_disconnect();
        tracing::debug!("Detached timer for slot {}", slot);
        Some(service)
    }

    pub fn get(&self, slot: PlayerSlot) -> Option<&TimerService<P>> {
        self.slots.get(slot.index())?.as_ref()
    }

    pub fn get_mut(&mut self, slot: PlayerSlot) -> Option<&mut TimerService<P>> {
        self.slots.get_mut(slot.index())?.as_mut()
    }

    /// Attached timers in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &TimerService<P>> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TimerService<P>> {
        self.slots.iter_mut().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop every active run. Returns how many were stopped.
    pub fn stop_all_runs(&mut self, play_sound: bool) -> usize {
        self.iter_mut()
            .map(|service| service.stop_run(play_sound))
            .filter(|stopped| *stopped)
            .count()
    }

    /// Map reset: stop all runs, then forget every session.
    pub fn on_round_start(&mut self) {
        let stopped = self.stop_all_runs(true);
        for service in self.iter_mut() {
            service.on_round_reset();
        }
        tracing::debug!("Round start: stopped {} runs", stopped);
    }

    /// Install a pause guard on every current and future timer.
    pub fn add_pause_guard(&mut self, guard: Rc<dyn PauseGuard>) {
        for service in self.slots.iter_mut().flatten() {
            service.add_pause_guard(Rc::clone(&guard));
        }
        self.pause_guards.push(guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimPlayer};
    use crate::timer::TimerSession;

    fn roster() -> PlayerTimers<SimPlayer> {
        PlayerTimers::new(Rc::new(SimClock::default()), TimerConfig::default())
    }

    #[test]
    fn attach_and_lookup() {
        let mut timers = roster();
        timers.attach(SimPlayer::new(3, "a")).unwrap();
        timers.attach(SimPlayer::new(64, "b")).unwrap();

        assert_eq!(timers.len(), 2);
        assert_eq!(timers.get(PlayerSlot(3)).unwrap().player().name, "a");
        assert!(timers.get(PlayerSlot(4)).is_none());
        let names: Vec<_> = timers.iter().map(|t| t.player().name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn attach_rejects_bad_slots() {
        let mut timers = roster();
        timers.attach(SimPlayer::new(1, "a")).unwrap();
        assert!(matches!(
            timers.attach(SimPlayer::new(1, "dup")),
            Err(CoreError::SlotOccupied(PlayerSlot(1)))
        ));
        assert!(matches!(
            timers.attach(SimPlayer::new(65, "far")),
            Err(CoreError::SlotOutOfRange { .. })
        ));
    }

    #[test]
    fn detach_resets_state() {
        let mut timers = roster();
        timers.attach(SimPlayer::new(2, "a")).unwrap().start_run("", true);

        let service = timers.detach(PlayerSlot(2)).unwrap();
        assert_eq!(service.session(), &TimerSession::default());
        assert!(timers.get(PlayerSlot(2)).is_none());
        assert!(timers.detach(PlayerSlot(2)).is_none());
    }

    #[test]
    fn round_start_stops_and_resets() {
        let mut timers = roster();
        timers.attach(SimPlayer::new(1, "a")).unwrap().start_run("", false);
        timers.attach(SimPlayer::new(2, "b")).unwrap();
        timers.get_mut(PlayerSlot(2)).unwrap().pause();

        timers.on_round_start();
        for timer in timers.iter() {
            assert_eq!(timer.session(), &TimerSession::default());
        }
        let sounds = &timers.get(PlayerSlot(1)).unwrap().player().sounds;
        assert_eq!(sounds.len(), 1);
    }

    #[test]
    fn stop_all_counts_running_timers() {
        let mut timers = roster();
        timers.attach(SimPlayer::new(1, "a")).unwrap().start_run("", false);
        timers.attach(SimPlayer::new(2, "b")).unwrap();
        assert_eq!(timers.stop_all_runs(false), 1);
        assert_eq!(timers.stop_all_runs(false), 0);
    }
}
