//! Scenario replay.
//!
//! A scenario is a TOML file describing players, listener vetoes and a list
//! of timed actions. The replay drives a roster of simulated players tick by
//! tick: at each tick the actions scheduled for it are applied, then every
//! timer integrates the tick and the clock moves forward.
//!
//! ```toml
//! tick_rate = 128
//!
//! [[players]]
//! slot = 1
//! name = "alice"
//!
//! [[steps]]
//! tick = 0
//! slot = 1
//! action = { type = "start" }
//! ```

use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::Args;
use serde::{Deserialize, Serialize};

use kztimer_core::player::Vec3;
use kztimer_core::sim::{SimClock, SimPlayer, Transition, VetoListener};
use kztimer_core::{
    Clock, CoreError, Event, EventRecorder, MoveType, PlayerSlot, PlayerTimers, Team,
    TimerConfig, TimerService, TimerSession, TimerSound,
};

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario file (TOML)
    scenario: PathBuf,
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Server time of tick zero.
    #[serde(default)]
    pub start_time: f64,
    /// Ticks to simulate. Defaults to one past the last step.
    pub ticks: Option<u64>,
    #[serde(default)]
    pub players: Vec<PlayerSpec>,
    #[serde(default)]
    pub vetoes: Vec<VetoSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_tick_rate() -> u32 {
    64
}

#[derive(Debug, Deserialize)]
pub struct PlayerSpec {
    pub slot: u32,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
    pub mode: Option<String>,
    pub mode_short: Option<String>,
    pub style_short: Option<String>,
}

/// A veto listener; without `slot` it applies to everyone.
#[derive(Debug, Deserialize)]
pub struct VetoSpec {
    pub slot: Option<u32>,
    pub refuse: Vec<Transition>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    pub tick: u64,
    pub slot: Option<u32>,
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Start {
        #[serde(default)]
        course: String,
        #[serde(default = "default_true")]
        sound: bool,
    },
    End {
        #[serde(default)]
        course: String,
    },
    /// The stop command.
    Stop,
    Invalidate,
    Pause,
    Resume {
        #[serde(default)]
        force: bool,
    },
    /// The pause command.
    TogglePause,
    /// Teleport to a checkpoint, counted against the run.
    Checkpoint,
    Teleport,
    TeleportToStart,
    Jump {
        #[serde(default = "default_jump_speed")]
        speed: f32,
    },
    Land,
    Noclip,
    LeaveNoclip,
    Death,
    Spawn,
    Team {
        team: Team,
    },
    Disconnect,
    RoundStart,
}

fn default_true() -> bool {
    true
}

fn default_jump_speed() -> f32 {
    250.0
}

/// Final state of one player, printed after the events.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "Snapshot")]
pub struct PlayerReport {
    pub slot: PlayerSlot,
    pub name: String,
    pub teleports: u32,
    pub session: TimerSession,
    pub sounds: Vec<TimerSound>,
    pub chat: Vec<String>,
    pub broadcasts: Vec<String>,
}

impl PlayerReport {
    fn from_timer(timer: &TimerService<SimPlayer>) -> Self {
        let player = timer.player();
        Self {
            slot: player.slot,
            name: player.name.clone(),
            teleports: player.teleport_count,
            session: timer.session().clone(),
            sounds: player.sounds.clone(),
            chat: player.chat.clone(),
            broadcasts: player.broadcasts.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Report {
    pub events: Vec<Event>,
    pub players: Vec<PlayerReport>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(content)?)
    }
}

impl PlayerSpec {
    fn to_player(&self) -> SimPlayer {
        let mut player = if self.bot {
            SimPlayer::bot(self.slot, &self.name)
        } else {
            SimPlayer::new(self.slot, &self.name)
        };
        if let Some(mode) = &self.mode {
            player.mode_name = mode.clone();
        }
        if let Some(short) = &self.mode_short {
            player.mode_short_name = short.clone();
        }
        if let Some(short) = &self.style_short {
            player.style_short_name = short.clone();
        }
        player
    }
}

/// Replay a scenario and collect what happened.
pub fn simulate(scenario: &Scenario, config: TimerConfig) -> Result<Report, CoreError> {
    if scenario.tick_rate == 0 {
        return Err(CoreError::Custom("tick_rate must be greater than zero".into()));
    }

    let clock = Rc::new(SimClock::starting_at(
        scenario.start_time,
        1.0 / f64::from(scenario.tick_rate),
    ));
    let mut timers = PlayerTimers::new(clock.clone(), config);

    let recorder = Rc::new(EventRecorder::new(clock.clone()));
    timers.listeners().register(&recorder);
    let vetoes: Vec<Rc<VetoListener>> = scenario
        .vetoes
        .iter()
        .map(|spec| {
            let veto = VetoListener::refusing(&spec.refuse);
            Rc::new(match spec.slot {
                Some(slot) => veto.for_slot(PlayerSlot(slot)),
                None => veto,
            })
        })
        .collect();
    for veto in &vetoes {
        timers.listeners().register(veto);
    }

    for spec in &scenario.players {
        timers.attach(spec.to_player())?;
    }

    let mut steps: Vec<&Step> = scenario.steps.iter().collect();
    steps.sort_by_key(|step| step.tick);
    let total = scenario
        .ticks
        .unwrap_or_else(|| steps.last().map_or(0, |step| step.tick + 1));

    let mut pending = steps.into_iter().peekable();
    for tick in 0..total {
        while let Some(step) = pending.next_if(|step| step.tick == tick) {
            apply(&mut timers, &clock, step)?;
        }
        for timer in timers.iter_mut() {
            timer.on_tick();
        }
        clock.tick();
    }

    let skipped = pending.count();
    if skipped > 0 {
        tracing::warn!("Skipped {} steps scheduled after tick {}", skipped, total);
    }
    tracing::info!("Simulated {} ticks for {} players", total, timers.len());

    Ok(Report {
        events: recorder.drain(),
        players: timers.iter().map(PlayerReport::from_timer).collect(),
    })
}

fn apply(
    timers: &mut PlayerTimers<SimPlayer>,
    clock: &SimClock,
    step: &Step,
) -> Result<(), CoreError> {
    tracing::debug!("Tick {}: {:?} for slot {:?}", step.tick, step.action, step.slot);

    let slot = match (&step.action, step.slot) {
        (Action::RoundStart, _) => {
            timers.on_round_start();
            return Ok(());
        }
        (_, Some(slot)) => PlayerSlot(slot),
        (_, None) => {
            return Err(CoreError::Custom(format!(
                "step at tick {} needs a slot",
                step.tick
            )))
        }
    };
    let missing = || CoreError::Custom(format!("no player in slot {} at tick {}", slot, step.tick));

    if let Action::Disconnect = step.action {
        timers.detach(slot).ok_or_else(missing)?;
        return Ok(());
    }
    let timer = timers.get_mut(slot).ok_or_else(missing)?;
    apply_to_player(timer, clock.now(), &step.action);
    Ok(())
}

fn apply_to_player(timer: &mut TimerService<SimPlayer>, now: f64, action: &Action) {
    match action {
        Action::Start { course, sound } => {
            timer.start_run(course, *sound);
        }
        Action::End { course } => {
            timer.end_run(course);
        }
        Action::Stop => {
            timer.command_stop();
        }
        Action::Invalidate => {
            timer.invalidate_run();
        }
        Action::Pause => {
            timer.pause();
        }
        Action::Resume { force } => {
            timer.resume(*force);
        }
        Action::TogglePause => {
            timer.command_pause();
        }
        Action::Checkpoint => {
            timer.player_mut().teleport_count += 1;
            timer.on_teleport();
        }
        Action::Teleport => timer.on_teleport(),
        Action::TeleportToStart => timer.on_teleport_to_start(),
        Action::Jump { speed } => {
            let player = timer.player_mut();
            player.grounded = false;
            player.velocity = Vec3::new(*speed, 0.0, 300.0);
        }
        Action::Land => {
            let player = timer.player_mut();
            player.grounded = true;
            player.velocity = Vec3::ZERO;
            player.landing_time = Some(now);
        }
        Action::Noclip => change_move_type(timer, MoveType::Noclip),
        Action::LeaveNoclip => {
            timer.player_mut().last_noclip_time = Some(now);
            change_move_type(timer, MoveType::Walk);
        }
        Action::Death => {
            timer.player_mut().alive = false;
            timer.on_death();
        }
        Action::Spawn => {
            let player = timer.player_mut();
            player.alive = true;
            player.grounded = true;
            player.velocity = Vec3::ZERO;
            player.move_type = MoveType::Walk;
            timer.on_spawn();
        }
        Action::Team { team } => timer.on_team_changed(*team),
        // Roster-wide, handled by the caller.
        Action::Disconnect | Action::RoundStart => {}
    }
}

fn change_move_type(timer: &mut TimerService<SimPlayer>, move_type: MoveType) {
    let old = timer.player().move_type;
    timer.player_mut().move_type = move_type;
    timer.on_move_type_changed(old);
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => TimerConfig::load_from(path)?,
        None => match TimerConfig::path() {
            Ok(path) if path.exists() => TimerConfig::load_from(&path)?,
            _ => TimerConfig::default(),
        },
    };
    let scenario = Scenario::load(&args.scenario)?;
    let report = simulate(&scenario, config)?;

    for event in &report.events {
        println!("{}", serde_json::to_string(event)?);
    }
    for player in &report.players {
        println!("{}", serde_json::to_string(player)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = include_str!("../../scenarios/basic_run.toml");

    fn kinds(report: &Report) -> Vec<(&'static str, u32)> {
        report
            .events
            .iter()
            .map(|event| (event.kind(), event.slot().0))
            .collect()
    }

    #[test]
    fn bundled_scenario_replays() {
        let scenario = Scenario::parse(BASIC).unwrap();
        let report = simulate(&scenario, TimerConfig::default()).unwrap();

        assert_eq!(
            kinds(&report),
            vec![
                ("RunStarted", 1),
                ("RunStarted", 2),
                ("Paused", 1),
                ("Resumed", 1),
                ("RunEnded", 1),
                ("RunEnded", 2),
            ]
        );

        let ended: Vec<f64> = report
            .events
            .iter()
            .filter_map(|event| match event {
                Event::RunEnded { time, .. } => Some(*time),
                _ => None,
            })
            .collect();
        assert!((ended[0] - 313.0 / 128.0).abs() < 1e-9);
        assert!((ended[1] - 601.0 / 128.0).abs() < 1e-9);

        let bob = &report.players[1];
        assert_eq!(bob.name, "bob");
        assert!(bob.chat.iter().any(|line| line.contains("Can't pause right now.")));
        assert!(bob.sounds.contains(&TimerSound::FalseEnd));

        // Round start wiped both sessions.
        assert!(report.players.iter().all(|p| p.session == TimerSession::default()));
    }

    #[test]
    fn steps_run_in_tick_order() {
        let scenario = Scenario::parse(
            r#"
            [[players]]
            slot = 1
            name = "a"

            [[steps]]
            tick = 10
            slot = 1
            action = { type = "stop" }

            [[steps]]
            tick = 2
            slot = 1
            action = { type = "start", course = "bonus", sound = false }
            "#,
        )
        .unwrap();
        let report = simulate(&scenario, TimerConfig::default()).unwrap();
        assert_eq!(kinds(&report), vec![("RunStarted", 1), ("RunStopped", 1)]);
        assert_eq!(report.players[0].sounds, vec![TimerSound::Stop]);
    }

    #[test]
    fn disconnect_removes_player() {
        let scenario = Scenario::parse(
            r#"
            [[players]]
            slot = 3
            name = "leaver"

            [[steps]]
            tick = 0
            slot = 3
            action = { type = "start" }

            [[steps]]
            tick = 5
            slot = 3
            action = { type = "disconnect" }
            "#,
        )
        .unwrap();
        let report = simulate(&scenario, TimerConfig::default()).unwrap();
        assert!(report.players.is_empty());
        assert_eq!(kinds(&report), vec![("RunStarted", 3), ("RunStopped", 3)]);
    }

    #[test]
    fn bad_scenarios_are_errors() {
        let no_slot =
            Scenario::parse("[[steps]]\ntick = 0\naction = { type = \"pause\" }\n").unwrap();
        assert!(simulate(&no_slot, TimerConfig::default()).is_err());

        let empty_slot = Scenario::parse(
            "[[steps]]\ntick = 0\nslot = 9\naction = { type = \"pause\" }\n",
        )
        .unwrap();
        assert!(simulate(&empty_slot, TimerConfig::default()).is_err());

        let zero_rate = Scenario::parse("tick_rate = 0\n").unwrap();
        assert!(simulate(&zero_rate, TimerConfig::default()).is_err());

        assert!(Scenario::parse("[[steps]]\ntick = 0\naction = { type = \"fly\" }\n").is_err());
    }

    #[test]
    fn snapshot_lines_are_tagged() {
        let scenario = Scenario::parse("[[players]]\nslot = 1\nname = \"a\"\n").unwrap();
        let report = simulate(&scenario, TimerConfig::default()).unwrap();
        let json = serde_json::to_value(&report.players[0]).unwrap();
        assert_eq!(json["type"], "Snapshot");
        assert_eq!(json["slot"], 1);
    }
}
