//! Serializable record of timer transitions.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::{Actor, Clock, PlayerSlot};
use crate::timer::{RunResult, TimerEventListener};

/// Every accepted timer transition produces an Event.
/// `server_time` is the game clock, `at` the wall clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RunStarted {
        slot: PlayerSlot,
        course: String,
        server_time: f64,
        at: DateTime<Utc>,
    },
    RunEnded {
        slot: PlayerSlot,
        course: String,
        time: f64,
        teleports_used: u32,
        server_time: f64,
        at: DateTime<Utc>,
    },
    RunStopped {
        slot: PlayerSlot,
        server_time: f64,
        at: DateTime<Utc>,
    },
    RunInvalidated {
        slot: PlayerSlot,
        server_time: f64,
        at: DateTime<Utc>,
    },
    Paused {
        slot: PlayerSlot,
        server_time: f64,
        at: DateTime<Utc>,
    },
    Resumed {
        slot: PlayerSlot,
        server_time: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn slot(&self) -> PlayerSlot {
        match self {
            Event::RunStarted { slot, .. }
            | Event::RunEnded { slot, .. }
            | Event::RunStopped { slot, .. }
            | Event::RunInvalidated { slot, .. }
            | Event::Paused { slot, .. }
            | Event::Resumed { slot, .. } => *slot,
        }
    }

    /// Short name of the variant, as used in the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RunStarted { .. } => "RunStarted",
            Event::RunEnded { .. } => "RunEnded",
            Event::RunStopped { .. } => "RunStopped",
            Event::RunInvalidated { .. } => "RunInvalidated",
            Event::Paused { .. } => "Paused",
            Event::Resumed { .. } => "Resumed",
        }
    }
}

/// Listener that turns every post hook into an [`Event`].
pub struct EventRecorder {
    clock: Rc<dyn Clock>,
    events: RefCell<Vec<Event>>,
}

impl EventRecorder {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            events: RefCell::new(Vec::new()),
        }
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Take the recorded events, leaving the recorder empty.
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn push(&self, event: Event) {
        tracing::trace!("Recorded {} for slot {}", event.kind(), event.slot());
        self.events.borrow_mut().push(event);
    }
}

impl std::fmt::Debug for EventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRecorder")
            .field("events", &self.events.borrow().len())
            .finish()
    }
}

impl TimerEventListener for EventRecorder {
    fn on_timer_start_post(&self, player: &dyn Actor, course: &str) {
        self.push(Event::RunStarted {
            slot: player.slot(),
            course: course.to_string(),
            server_time: self.clock.now(),
            at: Utc::now(),
        });
    }

    fn on_timer_end_post(&self, player: &dyn Actor, run: &RunResult) {
        self.push(Event::RunEnded {
            slot: player.slot(),
            course: run.course.clone(),
            time: run.time,
            teleports_used: run.teleports_used,
            server_time: self.clock.now(),
            at: Utc::now(),
        });
    }

    fn on_timer_stopped(&self, player: &dyn Actor) {
        self.push(Event::RunStopped {
            slot: player.slot(),
            server_time: self.clock.now(),
            at: Utc::now(),
        });
    }

    fn on_timer_invalidated(&self, player: &dyn Actor) {
        self.push(Event::RunInvalidated {
            slot: player.slot(),
            server_time: self.clock.now(),
            at: Utc::now(),
        });
    }

    fn on_pause_post(&self, player: &dyn Actor) {
        self.push(Event::Paused {
            slot: player.slot(),
            server_time: self.clock.now(),
            at: Utc::now(),
        });
    }

    fn on_resume_post(&self, player: &dyn Actor) {
        self.push(Event::Resumed {
            slot: player.slot(),
            server_time: self.clock.now(),
            at: Utc::now(),
        });
    }
}
