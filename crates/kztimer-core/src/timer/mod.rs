mod format;
mod hooks;
mod listener;
mod pause;
mod roster;
mod service;
mod session;

pub use format::{end_message, format_time};
pub use listener::{ListenerRegistry, RunResult, TimerEventListener};
pub use pause::{ImplicitCause, PauseGuard};
pub use roster::PlayerTimers;
pub use service::TimerService;
pub use session::{MovementSnapshot, TimerSession};
