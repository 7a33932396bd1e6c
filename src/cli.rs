// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};
use time::macros::format_description;
use time::Date;

use crate::model::MINUTES_PER_DAY;
use crate::types::{Minutes, StoreId};

/// Command-line arguments for `dayplan`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dayplan",
    version,
    about = "Plan tasks with prerequisites and deadlines onto days.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Dayplan.toml` in the current working directory. A missing
    /// default file means built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAYPLAN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

/// IDs on the command line are store ids, as printed by `show`.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the schedule for the coming days.
    Show {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Add a task.
    Add {
        name: String,

        /// Estimated duration in minutes.
        #[arg(long)]
        minutes: Minutes,

        /// Due date (YYYY-MM-DD), inclusive.
        #[arg(long, value_parser = parse_date)]
        due: Option<Date>,

        /// Prerequisite task; repeatable.
        #[arg(long = "after", value_name = "ID")]
        after: Vec<StoreId>,
    },

    /// Complete a task today.
    Done {
        id: StoreId,

        /// Actual minutes spent; defaults to the estimate.
        #[arg(long)]
        minutes: Option<Minutes>,
    },

    /// Delete a task.
    Delete { id: StoreId },

    /// Add a calendar event that blocks time on a day.
    Event {
        name: String,

        #[arg(long, value_parser = parse_date)]
        date: Date,

        /// Start time (HH:MM).
        #[arg(long, value_parser = parse_clock)]
        start: Minutes,

        /// End time (HH:MM); 24:00 is the end of the day.
        #[arg(long, value_parser = parse_clock)]
        end: Minutes,
    },

    /// Delete a calendar event.
    Unevent { id: StoreId },

    /// List overdue tasks, or complete the given ones today.
    Overdue {
        #[arg(long = "done", value_name = "ID")]
        done: Vec<StoreId>,
    },

    /// Track time against a task.
    #[command(subcommand)]
    Timer(TimerCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum TimerCommand {
    Start { id: StoreId },
    Stop,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date {s:?} (expected YYYY-MM-DD): {e}"))
}

/// `HH:MM` to minutes after midnight.
fn parse_clock(s: &str) -> Result<Minutes, String> {
    let (h, m) = s
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("invalid time {s:?} (expected HH:MM)"))?;
    let h: Minutes = h.parse().map_err(|_| format!("invalid hour in {s:?}"))?;
    let m: Minutes = m.parse().map_err(|_| format!("invalid minute in {s:?}"))?;
    if !(0..60).contains(&m) || !(0..=24).contains(&h) {
        return Err(format!("time {s:?} out of range"));
    }
    let minutes = h * 60 + m;
    if minutes > MINUTES_PER_DAY {
        return Err(format!("time {s:?} is past the end of the day"));
    }
    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn clock_times_parse_to_minutes() {
        assert_eq!(parse_clock("09:30"), Ok(570));
        assert_eq!(parse_clock("24:00"), Ok(MINUTES_PER_DAY));
        assert!(parse_clock("24:01").is_err());
        assert!(parse_clock("9.30").is_err());
    }

    #[test]
    fn add_command_parses_dates_and_prerequisites() {
        let args = CliArgs::try_parse_from([
            "dayplan", "add", "report", "--minutes", "90", "--due", "2025-06-04", "--after", "3",
            "--after", "5",
        ])
        .unwrap();
        match args.command {
            Command::Add {
                name,
                minutes,
                due,
                after,
            } => {
                assert_eq!(name, "report");
                assert_eq!(minutes, 90);
                assert_eq!(due, Some(date!(2025 - 06 - 04)));
                assert_eq!(after, vec![StoreId(3), StoreId(5)]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn timer_subcommands_parse() {
        let args = CliArgs::try_parse_from(["dayplan", "timer", "start", "7"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Timer(TimerCommand::Start { id: StoreId(7) })
        ));
    }
}
