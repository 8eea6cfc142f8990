mod clock;
mod engine;
mod phase;

pub use clock::{CancelHandle, Clock, ManualClock, ManualHandle, Tick, TokioClock, TokioHandle};
pub use engine::{PhaseTimer, StudyContext, TimerContext, TICK_INTERVAL};
pub use phase::{format_clock, Phase, TimerStatus};
