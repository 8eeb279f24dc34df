// Property-based tests for timer operation sequences
//
// Invariants checked after every step:
// 1. Refused pause/resume never touch the paused flag or the run flags
// 2. Time only grows on a tick of a live, running, unpaused timer
// 3. An accepted start resets time to zero and marks the run valid
// 4. A false end leaves the run and its time alone

#![allow(clippy::unwrap_used)]

use std::rc::Rc;

use kztimer_core::player::Vec3;
use kztimer_core::sim::{SimClock, SimPlayer};
use kztimer_core::{Clock, ListenerRegistry, MoveType, Team, TimerConfig, TimerService};
use proptest::prelude::*;

const TICK: f64 = 1.0 / 64.0;

#[derive(Debug, Clone)]
enum Op {
    Start(&'static str),
    End(&'static str),
    Stop,
    Invalidate,
    Pause,
    Resume(bool),
    Tick,
    Wait(u32),
    Jump,
    Land,
    Die,
    Spawn,
    Spectate,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let course = prop_oneof![Just(""), Just("bonus")];
    prop_oneof![
        2 => course.clone().prop_map(Op::Start),
        2 => course.prop_map(Op::End),
        1 => Just(Op::Stop),
        1 => Just(Op::Invalidate),
        2 => Just(Op::Pause),
        2 => any::<bool>().prop_map(Op::Resume),
        6 => Just(Op::Tick),
        2 => (1u32..2000).prop_map(Op::Wait),
        1 => Just(Op::Jump),
        1 => Just(Op::Land),
        1 => Just(Op::Die),
        1 => Just(Op::Spawn),
        1 => Just(Op::Spectate),
    ]
}

fn timer(clock: &Rc<SimClock>) -> TimerService<SimPlayer> {
    TimerService::new(
        SimPlayer::new(1, "prop"),
        ListenerRegistry::new(),
        clock.clone(),
        Rc::new(TimerConfig::default()),
    )
}

/// Run flags a refused pause or resume must not change.
fn pause_state(t: &TimerService<SimPlayer>) -> (bool, bool, bool, Option<f64>, Option<f64>) {
    let s = t.session();
    (
        s.is_paused(),
        s.has_paused_in_run(),
        s.has_resumed_in_run(),
        s.last_pause_time(),
        s.last_resume_time(),
    )
}

fn apply(t: &mut TimerService<SimPlayer>, clock: &SimClock, op: &Op) -> Result<(), TestCaseError> {
    let before_time = t.current_time();
    let before_pause = pause_state(t);

    match op {
        Op::Start(course) => {
            if t.start_run(course, true) {
                prop_assert!(t.is_running());
                prop_assert_eq!(t.current_time(), 0.0);
                prop_assert!(t.session().is_valid());
            } else {
                prop_assert_eq!(t.current_time(), before_time);
            }
        }
        Op::End(course) => {
            let was_running = t.is_running();
            let matches = t.session().current_course().eq_ignore_ascii_case(course);
            let ended = t.end_run(course);
            if !(was_running && matches) {
                prop_assert!(!ended);
                prop_assert_eq!(t.is_running(), was_running);
            }
            prop_assert_eq!(t.current_time(), before_time);
        }
        Op::Stop => {
            t.stop_run(true);
            prop_assert!(!t.is_running());
            prop_assert_eq!(t.current_time(), before_time);
        }
        Op::Invalidate => {
            t.invalidate_run();
            prop_assert!(!t.session().is_valid());
        }
        Op::Pause => {
            if !t.pause() {
                prop_assert_eq!(pause_state(t), before_pause);
            } else {
                prop_assert!(t.is_paused());
            }
        }
        Op::Resume(force) => {
            if !t.resume(*force) {
                prop_assert_eq!(pause_state(t), before_pause);
            } else {
                prop_assert!(!t.is_paused());
            }
        }
        Op::Tick => {
            let accrues = t.player().alive && t.is_running() && !t.is_paused();
            clock.tick();
            t.on_tick();
            let expected = if accrues { before_time + TICK } else { before_time };
            prop_assert_eq!(t.current_time(), expected);
        }
        Op::Wait(ms) => {
            clock.advance(f64::from(*ms) / 1000.0);
            prop_assert_eq!(t.current_time(), before_time);
        }
        Op::Jump => {
            if t.player().move_type != MoveType::None {
                t.player_mut().grounded = false;
                t.player_mut().velocity = Vec3::new(200.0, 0.0, 250.0);
            }
        }
        Op::Land => {
            let now = clock.now();
            let player = t.player_mut();
            player.grounded = true;
            player.velocity = Vec3::ZERO;
            player.landing_time = Some(now);
        }
        Op::Die => {
            t.player_mut().alive = false;
            t.on_death();
            prop_assert!(!t.is_running());
        }
        Op::Spawn => {
            let old = t.player().move_type;
            t.player_mut().alive = true;
            t.player_mut().move_type = MoveType::Walk;
            t.on_move_type_changed(old);
            t.on_spawn();
            prop_assert!(!t.is_paused());
        }
        Op::Spectate => {
            t.on_team_changed(Team::Spectator);
            prop_assert!(t.is_paused());
        }
    }

    prop_assert!(t.current_time() >= 0.0);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_sequences_hold_invariants(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let clock = Rc::new(SimClock::starting_at(500.0, TICK));
        let mut t = timer(&clock);
        for op in &ops {
            apply(&mut t, &clock, op)?;
        }
    }

    #[test]
    fn prop_tick_count_matches_time(ticks in 0usize..500) {
        let clock = Rc::new(SimClock::starting_at(500.0, TICK));
        let mut t = timer(&clock);
        prop_assert!(t.start_run("", false));
        for _ in 0..ticks {
            clock.tick();
            t.on_tick();
        }
        prop_assert!((t.current_time() - ticks as f64 * TICK).abs() < 1e-9);
    }
}
