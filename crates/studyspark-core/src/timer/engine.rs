//! Phase timer state machine.
//!
//! The timer counts down one second per `tick()` and chains work and break
//! phases on its own. It never sleeps: a [`Clock`] driver owned by the host
//! calls `tick()` once per second while the timer is running.
//!
//! ## State Transitions
//!
//! ```text
//! (Idle, Idle) --start--> (Work, Running) <--pause/resume--> (Work, Paused)
//! Work --0s--> ShortBreak | LongBreak --0s--> Work --0s--> ...
//! any --reset--> (Idle, Idle)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = PhaseTimer::new(ManualClock::new());
//! let mut ctx = StudyContext::new(Settings::default(), InMemoryLedger::new());
//! timer.start(None, &mut ctx);
//! // Once per second:
//! timer.tick(&mut ctx); // Some(Event::PhaseAdvanced { .. }) on a phase change
//! ```

use chrono::{NaiveDate, Utc};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::clock::{CancelHandle, Clock};
use super::phase::{format_clock, Phase, TimerStatus};
use crate::attention::{AttentionBuffer, AttentionSource};
use crate::events::Event;
use crate::ledger::{NewSession, SessionSink};
use crate::settings::Settings;

/// Interval between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Everything the timer reads or writes outside its own state.
pub trait TimerContext {
    fn settings(&self) -> &Settings;

    fn ledger(&mut self) -> &mut dyn SessionSink;

    fn attention(&mut self) -> &mut dyn AttentionSource;

    /// Calendar day stamped on new sessions.
    fn today(&self) -> NaiveDate {
        crate::ledger::today()
    }
}

/// Standard composition of settings, a ledger and an attention buffer.
#[derive(Debug, Clone, Default)]
pub struct StudyContext<S> {
    pub settings: Settings,
    pub ledger: S,
    pub attention: AttentionBuffer,
}

impl<S: SessionSink> StudyContext<S> {
    pub fn new(settings: Settings, ledger: S) -> Self {
        Self {
            settings,
            ledger,
            attention: AttentionBuffer::new(),
        }
    }
}

impl<S: SessionSink> TimerContext for StudyContext<S> {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn ledger(&mut self) -> &mut dyn SessionSink {
        &mut self.ledger
    }

    fn attention(&mut self) -> &mut dyn AttentionSource {
        &mut self.attention
    }
}

/// Work/break cycle driven by one-second ticks.
pub struct PhaseTimer<C: Clock> {
    clock: C,
    driver: Option<C::Handle>,
    phase: Phase,
    status: TimerStatus,
    time_remaining_secs: u64,
    /// Configured minutes of the phase currently loaded.
    phase_minutes: u32,
    cycles_completed: u32,
    current_task_id: Option<String>,
}

impl<C: Clock> PhaseTimer<C> {
    /// Create an idle timer.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            driver: None,
            phase: Phase::Idle,
            status: TimerStatus::Idle,
            time_remaining_secs: 0,
            phase_minutes: 0,
            cycles_completed: 0,
            current_task_id: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn time_remaining_secs(&self) -> u64 {
        self.time_remaining_secs
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn current_task_id(&self) -> Option<&str> {
        self.current_task_id.as_deref()
    }

    /// Whether a tick driver is scheduled.
    pub fn is_driving(&self) -> bool {
        self.driver.is_some()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// 0.0 .. 100.0 elapsed within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.phase_minutes as u64 * 60;
        if total == 0 {
            return 0.0;
        }
        let elapsed = total.saturating_sub(self.time_remaining_secs);
        elapsed as f64 / total as f64 * 100.0
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            status: self.status,
            phase_label: self.phase.label().to_string(),
            time_remaining_secs: self.time_remaining_secs,
            clock: format_clock(self.time_remaining_secs),
            progress_pct: self.progress(),
            cycles_completed: self.cycles_completed,
            task_id: self.current_task_id.clone(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a work phase from any state. The cycle count is kept.
    pub fn start<X>(&mut self, task_id: Option<String>, ctx: &mut X) -> Option<Event>
    where
        X: TimerContext + ?Sized,
    {
        self.stop_driver();
        self.current_task_id = task_id;
        self.enter_work(ctx);
        self.status = TimerStatus::Running;
        self.start_driver();

        Some(Event::TimerStarted {
            phase: self.phase,
            duration_secs: self.time_remaining_secs,
            task_id: self.current_task_id.clone(),
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        self.stop_driver();
        self.status = TimerStatus::Paused;
        Some(Event::TimerPaused {
            phase: self.phase,
            time_remaining_secs: self.time_remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Paused {
            return None;
        }
        self.status = TimerStatus::Running;
        self.start_driver();
        Some(Event::TimerResumed {
            phase: self.phase,
            time_remaining_secs: self.time_remaining_secs,
            at: Utc::now(),
        })
    }

    /// End the current phase now. A paused timer stays paused with the next
    /// phase loaded. No-op while idle.
    pub fn skip<X>(&mut self, ctx: &mut X) -> Option<Event>
    where
        X: TimerContext + ?Sized,
    {
        if self.phase == Phase::Idle {
            return None;
        }
        self.time_remaining_secs = 0;
        self.advance(ctx, true)
    }

    /// Back to idle with zero cycles. The ledger is untouched.
    pub fn reset(&mut self) -> Option<Event> {
        self.stop_driver();
        self.phase = Phase::Idle;
        self.status = TimerStatus::Idle;
        self.time_remaining_secs = 0;
        self.phase_minutes = 0;
        self.cycles_completed = 0;
        self.current_task_id = None;
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Advance one second. Returns `Some(Event::PhaseAdvanced)` when a phase
    /// ends; ignored unless running.
    pub fn tick<X>(&mut self, ctx: &mut X) -> Option<Event>
    where
        X: TimerContext + ?Sized,
    {
        if self.status != TimerStatus::Running {
            return None;
        }
        if self.time_remaining_secs > 0 {
            self.time_remaining_secs -= 1;
            return None;
        }
        self.advance(ctx, false)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance<X>(&mut self, ctx: &mut X, skipped: bool) -> Option<Event>
    where
        X: TimerContext + ?Sized,
    {
        let from = self.phase;
        let mut session_id = None;

        match from {
            Phase::Idle => return None,
            Phase::Work => {
                let attention_timeline = ctx.attention().drain();
                let session = NewSession {
                    task_id: self.current_task_id.clone(),
                    date: ctx.today(),
                    work_minutes: self.phase_minutes,
                    attention_timeline,
                };
                match ctx.ledger().add_session(session) {
                    Ok(record) => {
                        info!(
                            session_id = %record.id,
                            work_minutes = record.work_minutes,
                            samples = record.attention_timeline.len(),
                            "Recorded study session"
                        );
                        session_id = Some(record.id);
                    }
                    Err(e) => warn!("Failed to record study session: {e}"),
                }

                self.cycles_completed += 1;
                let settings = ctx.settings();
                let next = if self.cycles_completed.checked_rem(settings.cycles_to_long) == Some(0)
                {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                };
                let minutes = next.minutes(settings);
                self.load_phase(next, minutes);
            }
            Phase::ShortBreak | Phase::LongBreak => self.enter_work(ctx),
        }

        debug!(
            ?from,
            to = ?self.phase,
            cycles = self.cycles_completed,
            skipped,
            "Phase advanced"
        );

        Some(Event::PhaseAdvanced {
            from,
            to: self.phase,
            cycles_completed: self.cycles_completed,
            duration_secs: self.time_remaining_secs,
            session_id,
            skipped,
            at: Utc::now(),
        })
    }

    /// Load a work phase from the current settings. Samples left over from
    /// outside a work phase do not belong to it and are discarded.
    fn enter_work<X>(&mut self, ctx: &mut X)
    where
        X: TimerContext + ?Sized,
    {
        let stray = ctx.attention().drain();
        if !stray.is_empty() {
            debug!(samples = stray.len(), "Discarded attention samples recorded outside a work phase");
        }
        let minutes = ctx.settings().work_minutes;
        self.load_phase(Phase::Work, minutes);
    }

    fn load_phase(&mut self, phase: Phase, minutes: u32) {
        self.phase = phase;
        self.phase_minutes = minutes;
        self.time_remaining_secs = minutes as u64 * 60;
    }

    fn start_driver(&mut self) {
        self.stop_driver();
        self.driver = Some(self.clock.schedule_repeating(TICK_INTERVAL));
    }

    fn stop_driver(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.cancel();
        }
    }
}

impl<C: Clock> fmt::Debug for PhaseTimer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseTimer")
            .field("phase", &self.phase)
            .field("status", &self.status)
            .field("time_remaining_secs", &self.time_remaining_secs)
            .field("phase_minutes", &self.phase_minutes)
            .field("cycles_completed", &self.cycles_completed)
            .field("current_task_id", &self.current_task_id)
            .field("driving", &self.driver.is_some())
            .finish()
    }
}

impl<C: Clock> Drop for PhaseTimer<C> {
    fn drop(&mut self) {
        self.stop_driver();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::ledger::{InMemoryLedger, SessionRecord};
    use crate::timer::ManualClock;
    use proptest::prelude::*;

    fn settings() -> Settings {
        Settings {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            cycles_to_long: 4,
            ..Settings::default()
        }
    }

    fn setup() -> (PhaseTimer<ManualClock>, StudyContext<InMemoryLedger>, ManualClock) {
        let clock = ManualClock::new();
        let timer = PhaseTimer::new(clock.clone());
        let ctx = StudyContext::new(settings(), InMemoryLedger::new());
        (timer, ctx, clock)
    }

    /// Tick until the phase changes, feeding one attention sample per second
    /// while working.
    fn run_phase(
        timer: &mut PhaseTimer<ManualClock>,
        ctx: &mut StudyContext<InMemoryLedger>,
        score: f64,
    ) -> Event {
        loop {
            if timer.phase() == Phase::Work && timer.time_remaining_secs() > 0 {
                ctx.attention.record(score);
            }
            if let Some(event) = timer.tick(ctx) {
                return event;
            }
        }
    }

    #[test]
    fn starts_idle() {
        let (timer, _, clock) = setup();
        assert_eq!(timer.phase(), Phase::Idle);
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.time_remaining_secs(), 0);
        assert!(!timer.is_driving());
        assert!(!clock.is_ticking());
    }

    #[test]
    fn start_enters_running_work_phase() {
        let (mut timer, mut ctx, clock) = setup();
        let event = timer.start(Some("chem".into()), &mut ctx);
        assert!(matches!(
            event,
            Some(Event::TimerStarted { phase: Phase::Work, duration_secs: 1500, .. })
        ));
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.status(), TimerStatus::Running);
        assert_eq!(timer.time_remaining_secs(), 25 * 60);
        assert_eq!(timer.current_task_id(), Some("chem"));
        assert!(clock.is_ticking());
    }

    #[test]
    fn restart_replaces_the_driver_and_keeps_cycles() {
        let (mut timer, mut ctx, clock) = setup();
        timer.start(None, &mut ctx);
        timer.skip(&mut ctx);
        timer.start(None, &mut ctx);
        assert_eq!(clock.live_drivers(), 1);
        assert_eq!(clock.scheduled(), 2);
        assert_eq!(timer.cycles_completed(), 1);
        assert_eq!(timer.phase(), Phase::Work);
    }

    #[test]
    fn tick_decrements_by_one() {
        let (mut timer, mut ctx, _) = setup();
        timer.start(None, &mut ctx);
        assert!(timer.tick(&mut ctx).is_none());
        assert_eq!(timer.time_remaining_secs(), 25 * 60 - 1);
        assert_eq!(timer.phase(), Phase::Work);
    }

    #[test]
    fn tick_is_noop_unless_running() {
        let (mut timer, mut ctx, _) = setup();
        assert!(timer.tick(&mut ctx).is_none());
        assert_eq!(timer.phase(), Phase::Idle);
        assert_eq!(timer.time_remaining_secs(), 0);

        timer.start(None, &mut ctx);
        timer.pause();
        let before = timer.time_remaining_secs();
        assert!(timer.tick(&mut ctx).is_none());
        assert_eq!(timer.time_remaining_secs(), before);
        assert_eq!(timer.status(), TimerStatus::Paused);
    }

    #[test]
    fn pause_and_resume_manage_the_driver() {
        let (mut timer, mut ctx, clock) = setup();
        timer.start(None, &mut ctx);
        timer.tick(&mut ctx);

        assert!(timer.pause().is_some());
        assert!(!clock.is_ticking());
        assert_eq!(timer.time_remaining_secs(), 25 * 60 - 1);

        assert!(timer.resume().is_some());
        assert!(clock.is_ticking());
        assert_eq!(timer.status(), TimerStatus::Running);
        assert_eq!(timer.time_remaining_secs(), 25 * 60 - 1);
    }

    #[test]
    fn invalid_commands_are_silent_noops() {
        let (mut timer, mut ctx, clock) = setup();
        assert!(timer.pause().is_none());
        assert!(timer.resume().is_none());
        assert!(timer.skip(&mut ctx).is_none());
        assert_eq!(timer.phase(), Phase::Idle);
        assert!(ctx.ledger.is_empty());

        timer.start(None, &mut ctx);
        assert!(timer.resume().is_none());
        assert!(timer.pause().is_some());
        assert!(timer.pause().is_none());
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert_eq!(clock.scheduled(), 1);
    }

    #[test]
    fn work_completion_records_session_and_picks_short_break() {
        let (mut timer, mut ctx, _) = setup();
        ctx.settings.work_minutes = 1;
        timer.start(Some("bio".into()), &mut ctx);

        let event = run_phase(&mut timer, &mut ctx, 0.75);
        let Event::PhaseAdvanced { from, to, cycles_completed, duration_secs, session_id, skipped, .. } = event
        else {
            panic!("expected PhaseAdvanced");
        };
        assert_eq!(from, Phase::Work);
        assert_eq!(to, Phase::ShortBreak);
        assert_eq!(cycles_completed, 1);
        assert_eq!(duration_secs, 5 * 60);
        assert!(!skipped);

        let records = ctx.ledger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(Some(records[0].id), session_id);
        assert_eq!(records[0].work_minutes, 1);
        assert_eq!(records[0].task_id.as_deref(), Some("bio"));
        assert_eq!(records[0].attention_timeline, vec![0.75; 60]);
        assert!(ctx.attention.is_empty());
        assert_eq!(timer.status(), TimerStatus::Running);
    }

    #[test]
    fn long_break_on_every_nth_cycle() {
        let (mut timer, mut ctx, _) = setup();
        ctx.settings.cycles_to_long = 2;
        timer.start(None, &mut ctx);

        timer.skip(&mut ctx);
        assert_eq!(timer.phase(), Phase::ShortBreak);
        timer.skip(&mut ctx);
        assert_eq!(timer.phase(), Phase::Work);
        timer.skip(&mut ctx);
        assert_eq!(timer.phase(), Phase::LongBreak);
        assert_eq!(timer.time_remaining_secs(), 15 * 60);
        assert_eq!(timer.cycles_completed(), 2);
    }

    #[test]
    fn break_returns_to_work_with_current_settings() {
        let (mut timer, mut ctx, _) = setup();
        timer.start(None, &mut ctx);
        timer.skip(&mut ctx);

        // Adjusted between phases, e.g. by the adaptive advisor.
        ctx.settings.work_minutes = 30;
        timer.skip(&mut ctx);
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.time_remaining_secs(), 30 * 60);

        timer.skip(&mut ctx);
        assert_eq!(ctx.ledger.records()[1].work_minutes, 30);
    }

    #[test]
    fn session_records_configured_minutes_of_the_phase_that_ended() {
        let (mut timer, mut ctx, _) = setup();
        timer.start(None, &mut ctx);
        ctx.settings.work_minutes = 40;
        timer.skip(&mut ctx);
        assert_eq!(ctx.ledger.records()[0].work_minutes, 25);
    }

    #[test]
    fn skip_while_paused_loads_next_phase_and_stays_paused() {
        let (mut timer, mut ctx, clock) = setup();
        timer.start(None, &mut ctx);
        timer.pause();

        let event = timer.skip(&mut ctx);
        assert!(matches!(event, Some(Event::PhaseAdvanced { skipped: true, .. })));
        assert_eq!(timer.phase(), Phase::ShortBreak);
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert_eq!(timer.time_remaining_secs(), 5 * 60);
        assert!(!clock.is_ticking());
        assert_eq!(ctx.ledger.len(), 1);
    }

    #[test]
    fn skipped_work_phase_flushes_partial_timeline() {
        let (mut timer, mut ctx, _) = setup();
        timer.start(None, &mut ctx);
        for score in [0.2, 0.4, 0.6] {
            ctx.attention.record(score);
            timer.tick(&mut ctx);
        }
        timer.skip(&mut ctx);
        assert_eq!(ctx.ledger.records()[0].attention_timeline, vec![0.2, 0.4, 0.6]);
        assert!(ctx.attention.is_empty());
    }

    #[test]
    fn start_discards_stray_samples() {
        let (mut timer, mut ctx, _) = setup();
        ctx.attention.record(0.1);
        timer.start(None, &mut ctx);
        ctx.attention.record(0.9);
        timer.skip(&mut ctx);
        assert_eq!(ctx.ledger.records()[0].attention_timeline, vec![0.9]);
    }

    #[test]
    fn reset_returns_to_idle_and_keeps_ledger() {
        let (mut timer, mut ctx, clock) = setup();
        timer.start(Some("history".into()), &mut ctx);
        timer.skip(&mut ctx);
        timer.skip(&mut ctx);

        assert!(timer.reset().is_some());
        assert_eq!(timer.phase(), Phase::Idle);
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.time_remaining_secs(), 0);
        assert_eq!(timer.cycles_completed(), 0);
        assert_eq!(timer.current_task_id(), None);
        assert!(!clock.is_ticking());
        assert_eq!(ctx.ledger.len(), 1);

        // Teardown is idempotent.
        assert!(timer.reset().is_some());
        assert!(!clock.is_ticking());
    }

    #[test]
    fn zero_cycles_to_long_never_picks_long_break() {
        let (mut timer, mut ctx, _) = setup();
        ctx.settings.cycles_to_long = 0;
        timer.start(None, &mut ctx);
        for _ in 0..3 {
            timer.skip(&mut ctx);
            assert_eq!(timer.phase(), Phase::ShortBreak);
            timer.skip(&mut ctx);
        }
    }

    struct RejectingLedger;

    impl SessionSink for RejectingLedger {
        fn add_session(&mut self, _session: NewSession) -> crate::error::Result<SessionRecord> {
            Err(CoreError::Custom("store offline".into()))
        }
    }

    #[test]
    fn ledger_failure_does_not_block_advance() {
        let clock = ManualClock::new();
        let mut timer = PhaseTimer::new(clock);
        let mut ctx = StudyContext::new(settings(), RejectingLedger);
        timer.start(None, &mut ctx);
        ctx.attention.record(0.5);

        let event = timer.skip(&mut ctx);
        assert!(matches!(
            event,
            Some(Event::PhaseAdvanced { session_id: None, to: Phase::ShortBreak, .. })
        ));
        assert_eq!(timer.cycles_completed(), 1);
        assert!(ctx.attention.is_empty());
    }

    #[test]
    fn snapshot_reports_clock_and_progress() {
        let (mut timer, mut ctx, _) = setup();
        timer.start(None, &mut ctx);
        for _ in 0..75 {
            timer.tick(&mut ctx);
        }
        match timer.snapshot() {
            Event::StateSnapshot { phase, status, clock, phase_label, progress_pct, .. } => {
                assert_eq!(phase, Phase::Work);
                assert_eq!(status, TimerStatus::Running);
                assert_eq!(clock, "23:45");
                assert_eq!(phase_label, "Focus Time");
                assert!((progress_pct - 5.0).abs() < 1e-9);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[test]
    fn dropping_the_timer_cancels_its_driver() {
        let (mut timer, mut ctx, clock) = setup();
        timer.start(None, &mut ctx);
        drop(timer);
        assert!(!clock.is_ticking());
    }

    proptest! {
        #[test]
        fn tick_counts_down_without_changing_phase(ticks in 0u64..1500) {
            let (mut timer, mut ctx, _) = setup();
            timer.start(None, &mut ctx);
            for _ in 0..ticks {
                prop_assert!(timer.tick(&mut ctx).is_none());
            }
            prop_assert_eq!(timer.time_remaining_secs(), 1500 - ticks);
            prop_assert_eq!(timer.phase(), Phase::Work);
        }

        #[test]
        fn advance_from_work_picks_break_by_cycle_count(k in 0u32..20, cycles_to_long in 1u32..6) {
            let (mut timer, mut ctx, _) = setup();
            ctx.settings.cycles_to_long = cycles_to_long;
            timer.start(None, &mut ctx);
            for _ in 0..k {
                timer.skip(&mut ctx);
                timer.skip(&mut ctx);
            }
            prop_assert_eq!(timer.cycles_completed(), k);

            while timer.time_remaining_secs() > 0 {
                timer.tick(&mut ctx);
            }
            timer.tick(&mut ctx);

            prop_assert_eq!(timer.cycles_completed(), k + 1);
            if (k + 1) % cycles_to_long == 0 {
                prop_assert_eq!(timer.phase(), Phase::LongBreak);
                prop_assert_eq!(timer.time_remaining_secs(), 15 * 60);
            } else {
                prop_assert_eq!(timer.phase(), Phase::ShortBreak);
                prop_assert_eq!(timer.time_remaining_secs(), 5 * 60);
            }
        }
    }
}
