use clap::Args;
use serde_json::json;
use studyspark_core::adaptive::{adjustment_message, average_attention, recommend};
use studyspark_core::{Config, Database, SessionStore};
use uuid::Uuid;

use super::print_json;

#[derive(Args)]
pub struct AdviseArgs {
    /// Session id to base the recommendation on
    id: Uuid,
    /// Write the recommendation to timer.work_minutes
    #[arg(long)]
    apply: bool,
}

pub fn run(args: AdviseArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut config = Config::load()?;
    let session = db
        .session(args.id)?
        .ok_or_else(|| format!("session not found: {}", args.id))?;

    let current = config.timer.work_minutes;
    let recommended = recommend(&session.attention_timeline, &config.timer);
    let average = average_attention(&session.attention_timeline);
    let message = average.and_then(|avg| adjustment_message(avg, recommended, current));

    if args.apply && recommended != current {
        config.timer.work_minutes = recommended;
        config.save()?;
    }

    print_json(&json!({
        "session_id": session.id,
        "average_attention": average,
        "current_work_minutes": current,
        "recommended_work_minutes": recommended,
        "applied": args.apply && recommended != current,
        "message": message,
    }))
}
