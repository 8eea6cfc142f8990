use chrono::NaiveDate;
use clap::Args;
use studyspark_core::{Database, SessionStore};

use super::{parse_date, print_json};

#[derive(Args)]
pub struct SessionsArgs {
    /// Only sessions recorded on this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

pub fn run(args: SessionsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let sessions = match args.date {
        Some(date) => db.sessions_by_date(date)?,
        None => db.sessions()?,
    };
    print_json(&sessions)
}
