//! Integration tests for the player roster.

use std::rc::Rc;

use kztimer_core::sim::{SimClock, SimPlayer, Transition, VetoListener};
use kztimer_core::timer::TimerSession;
use kztimer_core::{
    Actor, CoreError, Event, EventRecorder, PauseGuard, PlayerSlot, PlayerTimers, TimerConfig,
    TimerSound,
};

fn roster(clock: &Rc<SimClock>) -> PlayerTimers<SimPlayer> {
    PlayerTimers::new(clock.clone(), TimerConfig::default())
}

#[test]
fn test_listeners_are_shared_across_players() {
    let clock = Rc::new(SimClock::default());
    let mut timers = roster(&clock);
    let recorder = Rc::new(EventRecorder::new(clock.clone()));
    timers.listeners().register(&recorder);

    for slot in 1..=3 {
        timers.attach(SimPlayer::new(slot, "p")).unwrap().start_run("", false);
    }

    let slots: Vec<_> = recorder.events().iter().map(Event::slot).collect();
    assert_eq!(slots, vec![PlayerSlot(1), PlayerSlot(2), PlayerSlot(3)]);
}

#[test]
fn test_slot_scoped_veto() {
    let clock = Rc::new(SimClock::default());
    let mut timers = roster(&clock);
    let veto = Rc::new(VetoListener::refusing(&[Transition::Start]).for_slot(PlayerSlot(2)));
    timers.listeners().register(&veto);

    timers.attach(SimPlayer::new(1, "free")).unwrap();
    timers.attach(SimPlayer::new(2, "blocked")).unwrap();

    assert!(timers.get_mut(PlayerSlot(1)).unwrap().start_run("", false));
    assert!(!timers.get_mut(PlayerSlot(2)).unwrap().start_run("", false));
}

#[test]
fn test_round_start_resets_everyone() {
    let clock = Rc::new(SimClock::default());
    let mut timers = roster(&clock);
    for slot in [4, 9, 12] {
        timers.attach(SimPlayer::new(slot, "p")).unwrap().start_run("", true);
    }
    clock.tick();
    for timer in timers.iter_mut() {
        timer.on_tick();
    }

    timers.on_round_start();

    for timer in timers.iter() {
        assert_eq!(timer.session(), &TimerSession::default());
        assert_eq!(timer.player().sounds, vec![TimerSound::Start, TimerSound::Stop]);
    }
}

#[test]
fn test_detach_frees_the_slot() {
    let clock = Rc::new(SimClock::default());
    let mut timers = roster(&clock);
    timers.attach(SimPlayer::new(5, "leaver")).unwrap();
    assert!(matches!(
        timers.attach(SimPlayer::new(5, "again")),
        Err(CoreError::SlotOccupied(_))
    ));

    let gone = timers.detach(PlayerSlot(5)).unwrap();
    assert_eq!(gone.player().name(), "leaver");
    assert!(timers.attach(SimPlayer::new(5, "again")).is_ok());
}

struct SlowDown;

impl PauseGuard for SlowDown {
    fn check(&self, player: &dyn Actor, _session: &TimerSession, _now: f64) -> Result<(), String> {
        if player.velocity().length_2d() > 0.0 {
            Err("slow down first".into())
        } else {
            Ok(())
        }
    }
}

#[test]
fn test_pause_guard_reaches_late_joiners() {
    let clock = Rc::new(SimClock::default());
    let mut timers = roster(&clock);
    timers.attach(SimPlayer::new(1, "early")).unwrap();
    timers.add_pause_guard(Rc::new(SlowDown));
    timers.attach(SimPlayer::new(2, "late")).unwrap();

    for timer in timers.iter_mut() {
        timer.start_run("", false);
        timer.player_mut().velocity = kztimer_core::player::Vec3::new(100.0, 0.0, 0.0);
        assert!(!timer.pause());
        assert!(timer.player().chat[0].contains("slow down first"));
    }
}
