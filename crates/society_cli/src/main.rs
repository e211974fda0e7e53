//! Operator CLI for the society directory store.
//!
//! # Responsibility
//! - Verify `society_core` linkage and the loaded config (`ping`).
//! - Print flat occupancy and export the directory from a database file.
//!
//! The CLI acts as an operator, not a resident: it reads the store directly
//! and does not go through identity checks.

use clap::{Parser, Subcommand};
use log::error;
use society_core::db::open_db;
use society_core::{
    export_csv, init_logging, DirectoryConfig, FlatRegistry, RecordRepository,
    SqliteRecordRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "society", version, about = "Society directory operator tools")]
struct Cli {
    /// JSON config file (admin handles, db path, logging).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database file; overrides `db_path` from the config.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core ping, version and configured admin count.
    Ping,
    /// Print every flat with its occupancy.
    Flats,
    /// Write the directory as CSV to stdout.
    ExportCsv {
        /// Reference date for ages, `YYYY-MM-DD`; defaults to today.
        #[arg(long)]
        today: Option<chrono::NaiveDate>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => DirectoryConfig::load(path)?,
        None => DirectoryConfig::default(),
    };
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }
    let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());

    match cli.command {
        Command::Ping => {
            for line in ping_lines(&config) {
                println!("{line}");
            }
        }
        Command::Flats => {
            let conn = open_db(&db_path)?;
            let repo = SqliteRecordRepository::new(&conn);
            let occupancy = FlatRegistry::new().occupancy(repo.list_flat_keys()?)?;
            for (flat, state) in occupancy {
                println!("{flat}\t{}", state.as_str());
            }
        }
        Command::ExportCsv { today } => {
            let conn = open_db(&db_path)?;
            let repo = SqliteRecordRepository::new(&conn);
            let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
            print!("{}", export_csv(&repo.list_records()?, today)?);
        }
    }
    Ok(())
}

fn ping_lines(config: &DirectoryConfig) -> Vec<String> {
    let policy = config.access_policy();
    vec![
        format!("society_core ping={}", society_core::ping()),
        format!("society_core version={}", society_core::core_version()),
        format!("society_core admins={}", policy.admins().len()),
    ]
}

#[cfg(test)]
mod tests {
    use super::{ping_lines, Cli};
    use clap::CommandFactory;
    use society_core::DirectoryConfig;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ping_reports_distinct_configured_admins() {
        let config = DirectoryConfig::from_json_str(
            r#"{"admin_handles": ["Secretary@Society.org", "secretary@society.org", "t@society.org"]}"#,
        )
        .unwrap();

        let lines = ping_lines(&config);
        assert_eq!(lines[0], "society_core ping=pong");
        assert_eq!(lines[2], "society_core admins=2");
        assert_eq!(ping_lines(&DirectoryConfig::default())[2], "society_core admins=0");
    }
}
