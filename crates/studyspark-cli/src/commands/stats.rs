use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;
use studyspark_core::ledger::today;
use studyspark_core::stats::{day_stats, format_duration, goal_progress, group_by_date};
use studyspark_core::{Config, Database, LedgerStats, SessionStore};
use uuid::Uuid;

use super::{parse_date, print_json};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// Stats for one day
    Date {
        /// Day as YYYY-MM-DD
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Stats for one recorded session
    Session {
        /// Session id
        id: Uuid,
    },
    /// Consecutive study days ending today or yesterday
    Streak,
    /// All-time summary
    Summary,
    /// Progress toward today's focus goal
    Goal,
    /// Per-day stats for every day with sessions, oldest first
    History,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Today => print_json(&db.today_stats()?)?,
        StatsAction::Date { date } => print_json(&db.stats_for_date(date)?)?,
        StatsAction::Session { id } => match db.session_stats(id)? {
            Some(stats) => print_json(&stats)?,
            None => return Err(format!("no attention data for session {id}").into()),
        },
        StatsAction::Streak => {
            print_json(&json!({ "current_streak": db.current_streak()? }))?;
        }
        StatsAction::Summary => {
            let summary = db.summary()?;
            print_json(&json!({
                "summary": summary,
                "total_focus": format_duration(summary.total_focus_minutes),
            }))?;
        }
        StatsAction::Goal => {
            let config = Config::load()?;
            let focus = db.stats_for_date(today())?.total_focus_time;
            print_json(&goal_progress(focus, config.goals.daily_goal_minutes))?;
        }
        StatsAction::History => {
            let sessions = db.sessions()?;
            let days: Vec<_> = group_by_date(&sessions)
                .into_iter()
                .map(|(date, day)| {
                    json!({
                        "date": date,
                        "sessions": day.len(),
                        "stats": day_stats(&sessions, date),
                    })
                })
                .collect();
            print_json(&days)?;
        }
    }
    Ok(())
}
