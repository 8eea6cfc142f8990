//! Tick drivers.
//!
//! The phase timer never sleeps or spawns on its own. It asks a [`Clock`] for
//! a repeating driver when it starts or resumes and cancels the driver when it
//! pauses or resets. How ticks reach `PhaseTimer::tick` is up to the host:
//! [`TokioClock`] delivers them over a channel, [`ManualClock`] lets tests
//! drive ticks by hand.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Stops a repeating driver. Cancelling twice is a no-op.
pub trait CancelHandle {
    fn cancel(&mut self);
}

/// Source of repeating tick drivers.
pub trait Clock {
    type Handle: CancelHandle;

    fn schedule_repeating(&mut self, interval: Duration) -> Self::Handle;
}

// ── Manual ───────────────────────────────────────────────────────────

/// Clock for tests and embedded hosts that tick synchronously.
///
/// Clones share counters, so a test can keep a clone to observe the timer's
/// driver lifecycle.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    live: Arc<AtomicUsize>,
    scheduled: Arc<AtomicUsize>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any driver is currently scheduled.
    pub fn is_ticking(&self) -> bool {
        self.live_drivers() > 0
    }

    pub fn live_drivers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Total drivers ever scheduled.
    pub fn scheduled(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ManualHandle {
    live: Option<Arc<AtomicUsize>>,
}

impl CancelHandle for ManualHandle {
    fn cancel(&mut self) {
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Clock for ManualClock {
    type Handle = ManualHandle;

    fn schedule_repeating(&mut self, _interval: Duration) -> ManualHandle {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        ManualHandle {
            live: Some(Arc::clone(&self.live)),
        }
    }
}

// ── Tokio ────────────────────────────────────────────────────────────

/// One tick from a [`TokioClock`] driver, tagged with the driver generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick(u64);

/// Clock backed by `tokio::time::interval`.
///
/// Each driver is a spawned task that sends [`Tick`]s into the channel
/// returned by [`TokioClock::new`]. Ticks already queued when a driver is
/// cancelled can still arrive; hosts filter them with [`TokioClock::is_live`].
/// Scheduling must happen inside a tokio runtime.
#[derive(Debug)]
pub struct TokioClock {
    tx: mpsc::UnboundedSender<Tick>,
    live: Arc<AtomicU64>,
    next_generation: u64,
}

impl TokioClock {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = Self {
            tx,
            live: Arc::new(AtomicU64::new(0)),
            next_generation: 1,
        };
        (clock, rx)
    }

    /// True if the tick came from the driver that is currently scheduled.
    pub fn is_live(&self, tick: &Tick) -> bool {
        self.live.load(Ordering::SeqCst) == tick.0
    }
}

#[derive(Debug)]
pub struct TokioHandle {
    generation: u64,
    live: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl CancelHandle for TokioHandle {
    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = self
                .live
                .compare_exchange(self.generation, 0, Ordering::SeqCst, Ordering::SeqCst);
        }
    }
}

impl Drop for TokioHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Clock for TokioClock {
    type Handle = TokioHandle;

    fn schedule_repeating(&mut self, interval: Duration) -> TokioHandle {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.live.store(generation, Ordering::SeqCst);

        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(Tick(generation)).is_err() {
                    break;
                }
            }
        });

        TokioHandle {
            generation,
            live: Arc::clone(&self.live),
            task: Some(task),
        }
    }
}
