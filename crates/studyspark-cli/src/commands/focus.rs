//! Foreground focus session.
//!
//! Runs the phase timer on a tokio clock and reads commands from stdin, one
//! per line. Every event is printed as a JSON line on stdout.

use clap::Args;
use serde_json::json;
use studyspark_core::adaptive::{self, LOW_ATTENTION};
use studyspark_core::{
    Config, Database, Event, Phase, PhaseTimer, SessionStore, Settings, StudyContext,
    StudyMethod, TimerStatus, TokioClock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use uuid::Uuid;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Args)]
pub struct FocusArgs {
    /// Task the work phases are recorded against
    #[arg(long)]
    task: Option<String>,
    /// Study method preset to switch to before starting
    #[arg(long)]
    method: Option<StudyMethod>,
}

/// One stdin line.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Input {
    Start,
    Pause,
    Resume,
    Skip,
    Reset,
    Status,
    Quit,
    Sample(f64),
}

fn parse_input(line: &str) -> Result<Input, String> {
    let input = match line.trim() {
        "start" => Input::Start,
        "pause" => Input::Pause,
        "resume" => Input::Resume,
        "skip" => Input::Skip,
        "reset" => Input::Reset,
        "status" => Input::Status,
        "quit" | "exit" => Input::Quit,
        other => {
            let score: f64 = other
                .parse()
                .map_err(|_| format!("unrecognized input: {other}"))?;
            if !(0.0..=1.0).contains(&score) {
                return Err(format!("attention sample out of range 0..1: {score}"));
            }
            Input::Sample(score)
        }
    };
    Ok(input)
}

/// Counts consecutive low-attention samples and fires once per run.
#[derive(Debug, Default)]
struct DistractionWatch {
    threshold_secs: u32,
    low_streak: u32,
}

impl DistractionWatch {
    fn new(threshold_secs: u32) -> Self {
        Self {
            threshold_secs,
            low_streak: 0,
        }
    }

    /// Returns the streak length when it first reaches the threshold.
    fn observe(&mut self, score: f64) -> Option<u32> {
        if score >= LOW_ATTENTION {
            self.low_streak = 0;
            return None;
        }
        self.low_streak += 1;
        (self.threshold_secs > 0 && self.low_streak == self.threshold_secs)
            .then_some(self.low_streak)
    }

    fn clear(&mut self) {
        self.low_streak = 0;
    }
}

/// A work-length change suggested by the advisor.
#[derive(Debug, Clone, PartialEq)]
struct Adjustment {
    old: u32,
    new: u32,
    avg: f64,
    message: String,
}

/// Advisor outcome for a finished session, `None` when nothing changes.
///
/// A failed ledger read only skips the adjustment; the session keeps running.
fn advise_after<S>(ledger: &S, session_id: Uuid, settings: &Settings) -> Option<Adjustment>
where
    S: SessionStore + ?Sized,
{
    if !settings.adaptive_enabled {
        return None;
    }
    let session = match ledger.session(session_id) {
        Ok(session) => session?,
        Err(e) => {
            warn!(%session_id, "Failed to read session for adjustment: {e}");
            return None;
        }
    };
    let avg = adaptive::average_attention(&session.attention_timeline)?;

    let old = settings.work_minutes;
    let new = adaptive::recommend_for_average(avg, old);
    let message = adaptive::adjustment_message(avg, new, old)?;
    Some(Adjustment { old, new, avg, message })
}

struct FocusSession {
    timer: PhaseTimer<TokioClock>,
    /// Task given on the command line; reused by `start` after a reset.
    task_id: Option<String>,
    ctx: StudyContext<Database>,
    config: Config,
    watch: DistractionWatch,
}

impl FocusSession {
    fn emit(&self, value: &impl serde::Serialize) -> CliResult {
        println!("{}", serde_json::to_string(value)?);
        Ok(())
    }

    fn handle_event(&mut self, event: Option<Event>) -> CliResult {
        let Some(event) = event else {
            return Ok(());
        };
        self.emit(&event)?;

        match event {
            Event::PhaseAdvanced {
                from: Phase::Work,
                session_id,
                ..
            } => {
                self.watch.clear();
                if let Some(id) = session_id {
                    self.adapt_after(id)?;
                }
            }
            Event::PhaseAdvanced { .. } | Event::TimerStarted { .. } | Event::TimerReset { .. } => {
                self.watch.clear();
            }
            _ => {}
        }
        Ok(())
    }

    /// Feed a finished session to the advisor and persist the new work length.
    fn adapt_after(&mut self, session_id: Uuid) -> CliResult {
        let Some(Adjustment { old, new, avg, message }) =
            advise_after(&self.ctx.ledger, session_id, &self.ctx.settings)
        else {
            return Ok(());
        };

        self.ctx.settings.work_minutes = new;
        self.config.timer.work_minutes = new;
        if let Err(e) = self.config.save() {
            warn!("Failed to save adjusted work duration: {e}");
        }
        debug!(old, new, avg, "Adjusted work duration");
        self.emit(&json!({
            "type": "work_duration_adjusted",
            "session_id": session_id,
            "old_minutes": old,
            "new_minutes": new,
            "message": message,
        }))
    }

    fn record_sample(&mut self, score: f64) -> CliResult {
        if self.timer.phase() != Phase::Work || self.timer.status() != TimerStatus::Running {
            warn!("Attention sample ignored outside a running work phase");
            return Ok(());
        }
        self.ctx.attention.record(score);
        if let Some(seconds) = self.watch.observe(score) {
            self.emit(&json!({
                "type": "attention_alert",
                "unfocused_secs": seconds,
                "at": chrono::Utc::now(),
            }))?;
        }
        Ok(())
    }

    /// Apply one stdin command. Returns `false` to stop the session.
    fn apply(&mut self, input: Input) -> CliResult<bool> {
        let event = match input {
            Input::Start => self.timer.start(self.task_id.clone(), &mut self.ctx),
            Input::Pause => self.timer.pause(),
            Input::Resume => self.timer.resume(),
            Input::Skip => self.timer.skip(&mut self.ctx),
            Input::Reset => self.timer.reset(),
            Input::Status => Some(self.timer.snapshot()),
            Input::Sample(score) => {
                self.record_sample(score)?;
                None
            }
            Input::Quit => return Ok(false),
        };
        self.handle_event(event)?;
        Ok(true)
    }
}

pub fn run(args: FocusArgs) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_session(args))
}

async fn run_session(args: FocusArgs) -> CliResult {
    let mut config = Config::load()?;
    if let Some(method) = args.method {
        config.apply_method(method);
        config.save()?;
    }

    let (clock, mut ticks) = TokioClock::new();
    let mut session = FocusSession {
        timer: PhaseTimer::new(clock),
        task_id: args.task,
        ctx: StudyContext::new(config.timer.clone(), Database::open()?),
        watch: DistractionWatch::new(config.timer.attention_threshold_seconds),
        config,
    };

    let started = session
        .timer
        .start(session.task_id.clone(), &mut session.ctx);
    session.handle_event(started)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                if !session.timer.clock().is_live(&tick) {
                    continue;
                }
                let event = session.timer.tick(&mut session.ctx);
                session.handle_event(event)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_input(&line) {
                    Ok(input) => {
                        if !session.apply(input)? {
                            break;
                        }
                    }
                    Err(e) => warn!("{e}"),
                }
            }
        }
    }

    // Attention left in the buffer belongs to an unfinished phase.
    let discarded = session.ctx.attention.flush_and_clear();
    if !discarded.is_empty() {
        debug!(samples = discarded.len(), "Discarded samples from unfinished phase");
    }
    Ok(())
}
