//! Per-player timer state.

use serde::{Deserialize, Serialize};

/// Movement sub-state frozen by a pause and handed back on resume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementSnapshot {
    /// Player was on a ladder when pausing; resume puts them back on it.
    pub on_ladder: bool,
    pub duck_amount: f32,
    pub stamina: f32,
}

/// Timer state owned by one player.
///
/// `running` and `paused` are independent; time only accrues while the
/// player is alive, running and not paused. Timestamps are server time in
/// seconds, `None` meaning the event never happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerSession {
    pub(crate) running: bool,
    pub(crate) valid_time: bool,
    pub(crate) current_time: f64,
    pub(crate) current_course: String,
    pub(crate) last_start_mode: String,
    pub(crate) last_start_time: Option<f64>,

    pub(crate) paused: bool,
    /// Taken exactly once by the resume that ends the pause.
    #[serde(default)]
    pub(crate) pause_snapshot: Option<MovementSnapshot>,
    pub(crate) has_paused_in_run: bool,
    pub(crate) has_resumed_in_run: bool,
    pub(crate) last_pause_time: Option<f64>,
    pub(crate) last_resume_time: Option<f64>,

    pub(crate) last_start_sound_time: Option<f64>,
    pub(crate) last_end_time: Option<f64>,
    pub(crate) last_false_end_time: Option<f64>,
    pub(crate) last_teleport_time: Option<f64>,
}

impl TimerSession {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_valid(&self) -> bool {
        self.valid_time
    }

    /// Elapsed time of the active (or last) run in seconds.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn current_course(&self) -> &str {
        &self.current_course
    }

    pub fn last_start_mode(&self) -> &str {
        &self.last_start_mode
    }

    pub fn last_start_time(&self) -> Option<f64> {
        self.last_start_time
    }

    pub fn pause_snapshot(&self) -> Option<&MovementSnapshot> {
        self.pause_snapshot.as_ref()
    }

    pub fn has_paused_in_run(&self) -> bool {
        self.has_paused_in_run
    }

    pub fn has_resumed_in_run(&self) -> bool {
        self.has_resumed_in_run
    }

    pub fn last_pause_time(&self) -> Option<f64> {
        self.last_pause_time
    }

    pub fn last_resume_time(&self) -> Option<f64> {
        self.last_resume_time
    }

    pub fn last_end_time(&self) -> Option<f64> {
        self.last_end_time
    }

    pub fn last_false_end_time(&self) -> Option<f64> {
        self.last_false_end_time
    }

    pub fn last_teleport_time(&self) -> Option<f64> {
        self.last_teleport_time
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Back to the state of a freshly attached player.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Clear the one-shot flags that belong to a single run.
    pub(crate) fn begin_run(&mut self, course: String, mode: String, now: f64) {
        self.current_time = 0.0;
        self.last_start_time = Some(now);
        self.running = true;
        self.current_course = course;
        self.last_start_mode = mode;
        self.valid_time = true;
        self.has_paused_in_run = false;
        self.has_resumed_in_run = false;
    }

    pub(crate) fn mark_paused(&mut self, now: f64) {
        self.paused = true;
        if self.running {
            self.has_paused_in_run = true;
            self.last_pause_time = Some(now);
        }
    }

    pub(crate) fn mark_resumed(&mut self, now: f64) {
        self.paused = false;
        if self.running {
            self.has_resumed_in_run = true;
            self.last_resume_time = Some(now);
        }
    }
}

/// True when `since` happened less than `window` seconds before `now`.
pub(crate) fn within(since: Option<f64>, now: f64, window: f64) -> bool {
    since.is_some_and(|t| now - t < window)
}
