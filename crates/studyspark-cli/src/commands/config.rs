use clap::Subcommand;
use serde_json::json;
use studyspark_core::{Config, StudyMethod};

use super::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.work_minutes", "goals.daily_goal_minutes")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Apply a study method preset, or list presets when no slug is given
    Method {
        /// Preset slug: pomodoro, 52-17, deep-work-90-20
        slug: Option<String>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            print_json(&config)?;
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Method { slug: None } => {
            let presets: Vec<_> = StudyMethod::ALL
                .iter()
                .map(|m| {
                    let s = m.settings();
                    json!({
                        "slug": m.slug(),
                        "title": m.title(),
                        "work_minutes": s.work_minutes,
                        "short_break_minutes": s.short_break_minutes,
                        "long_break_minutes": s.long_break_minutes,
                    })
                })
                .collect();
            print_json(&presets)?;
        }
        ConfigAction::Method { slug: Some(slug) } => {
            let method: StudyMethod = slug.parse()?;
            let mut config = Config::load()?;
            config.apply_method(method);
            config.save()?;
            print_json(&config.timer)?;
        }
    }
    Ok(())
}
