//! Listener protocol for rule modules.
//!
//! Modes, styles, anti-cheat and record keeping hook into the timer by
//! implementing [`TimerEventListener`] and registering with a
//! [`ListenerRegistry`]. The registry only keeps weak references: a module
//! owns its listener and unloading it is enough to stop receiving hooks.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::player::Actor;

/// Outcome of a finished run, as seen by end hooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub course: String,
    /// Final time in seconds, including the tick that triggered the end.
    pub time: f64,
    pub teleports_used: u32,
}

impl RunResult {
    /// A run finished without checkpoint teleports.
    pub fn is_pro(&self) -> bool {
        self.teleports_used == 0
    }
}

/// Hooks a rule module can attach to timer transitions.
///
/// Hooks returning `bool` are vetoes: every registered listener is asked,
/// and the transition only goes through if all of them return `true`.
/// The `_post` hooks run after an accepted transition and cannot refuse it.
pub trait TimerEventListener {
    fn on_timer_start(&self, _player: &dyn Actor, _course: &str) -> bool {
        true
    }

    fn on_timer_start_post(&self, _player: &dyn Actor, _course: &str) {}

    fn on_timer_end(&self, _player: &dyn Actor, _run: &RunResult) -> bool {
        true
    }

    /// Lets a module keep the end but suppress the broadcast, e.g. because
    /// it prints its own.
    fn on_timer_end_message(&self, _player: &dyn Actor, _run: &RunResult) -> bool {
        true
    }

    fn on_timer_end_post(&self, _player: &dyn Actor, _run: &RunResult) {}

    fn on_timer_stopped(&self, _player: &dyn Actor) {}

    fn on_timer_invalidated(&self, _player: &dyn Actor) {}

    fn on_pause(&self, _player: &dyn Actor) -> bool {
        true
    }

    fn on_pause_post(&self, _player: &dyn Actor) {}

    fn on_resume(&self, _player: &dyn Actor) -> bool {
        true
    }

    fn on_resume_post(&self, _player: &dyn Actor) {}
}

/// Ordered set of listeners, compared by identity.
///
/// Cloning the registry clones the handle, not the list: every
/// [`TimerService`](super::TimerService) built from the same registry sees the
/// same listeners.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Rc<RefCell<Vec<Weak<dyn TimerEventListener>>>>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Returns `false` if it is already registered.
    pub fn register<L: TimerEventListener + 'static>(&self, listener: &Rc<L>) -> bool {
        let listener: Rc<dyn TimerEventListener> = listener.clone();
        let weak = Rc::downgrade(&listener);

        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|l| l.strong_count() > 0);
        if listeners.iter().any(|l| same_listener(l, &weak)) {
            return false;
        }
        listeners.push(weak);
        true
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unregister<L: TimerEventListener + 'static>(&self, listener: &Rc<L>) -> bool {
        let listener: Rc<dyn TimerEventListener> = listener.clone();
        let weak = Rc::downgrade(&listener);

        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|l| same_listener(l, &weak)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of live registered listeners.
    pub fn len(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ask every listener and AND the answers. No short circuit: a veto
    /// early in the list does not hide the attempt from later listeners.
    pub(crate) fn poll<F>(&self, mut hook: F) -> bool
    where
        F: FnMut(&dyn TimerEventListener) -> bool,
    {
        self.live()
            .iter()
            .fold(true, |allow, listener| hook(listener.as_ref()) && allow)
    }

    /// Run a post hook on every listener in registration order.
    pub(crate) fn notify<F>(&self, mut hook: F)
    where
        F: FnMut(&dyn TimerEventListener),
    {
        for listener in self.live() {
            hook(listener.as_ref());
        }
    }

    /// Strong handles for one dispatch. Hooks are free to (un)register
    /// while it runs; changes apply from the next dispatch on.
    fn live(&self) -> Vec<Rc<dyn TimerEventListener>> {
        self.listeners
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

fn same_listener(a: &Weak<dyn TimerEventListener>, b: &Weak<dyn TimerEventListener>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), b.as_ptr())
}
