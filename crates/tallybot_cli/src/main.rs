//! Command line front end for the tally bot.
//!
//! Usage:
//!   tallybot run --config bot.json --user 1001 --chat 42 < entries.txt
//!   tallybot seed --config bot.json --start 01/10/26 --days 60
//!   tallybot report --config bot.json daily
//!   tallybot show --config bot.json --unit A --row 7

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tallybot_core::format::{format_daily, format_totals};
use tallybot_core::{
    init_logging, AppConfig, ChatId, Clock, Dispatcher, LocalClock, MessageHandler, Outcome,
    RawMessage, ReportService, SqliteStore, Transport, TransportError, Unit, UserId,
};

#[derive(Parser)]
#[command(name = "tallybot")]
#[command(about = "Record chat tally entries into a date-indexed sheet store")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short = 'c', long, global = true, default_value = "tallybot.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read entries from stdin, one message per line, and print the replies
    Run {
        /// Sender id attached to every line
        #[arg(short = 'u', long)]
        user: i64,

        /// Chat id replies are addressed to
        #[arg(long, default_value = "0")]
        chat: i64,
    },
    /// Write the date column of every unit sheet
    Seed {
        /// First date, formatted dd/mm/yy
        #[arg(short = 's', long)]
        start: String,

        /// Number of consecutive days (capped at the configured row count)
        #[arg(short = 'd', long, default_value = "95")]
        days: u32,
    },
    /// Print a tally report
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
    },
    /// Print the raw cells of one sheet row
    Show {
        #[arg(long)]
        unit: String,

        #[arg(long)]
        row: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Daily,
    Totals,
}

/// Prints replies to stdout.
struct ConsoleTransport;

impl Transport for ConsoleTransport {
    fn send(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        println!("[chat {}] {}", chat_id.0, text);
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging(&config.logging.level, config.logging.dir.as_deref()) {
        eprintln!("Error initializing logging: {err}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Run { user, chat } => run(&config, UserId(user), ChatId(chat)),
        Command::Seed { start, days } => seed(&config, &start, days),
        Command::Report { kind } => report(&config, kind),
        Command::Show { unit, row } => show(&config, &unit, row),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig, user: UserId, chat: ChatId) -> Result<(), String> {
    let clock = Arc::new(LocalClock);
    let store = match &config.store_path {
        Some(_) => open_store(config)?,
        None => {
            // Without a file the session starts from a sheet dated from today.
            let store = SqliteStore::open_in_memory().map_err(|err| err.to_string())?;
            let units = config.valid_units().map_err(|err| err.to_string())?;
            store
                .prepare_dates(
                    &config.sheet,
                    units.iter(),
                    clock.today(),
                    config.sheet.date_row_count,
                )
                .map_err(|err| err.to_string())?;
            store
        }
    };

    let handler = MessageHandler::new(config, Arc::new(store), Arc::new(ConsoleTransport), clock)
        .map_err(|err| err.to_string())?;
    let dispatcher =
        Dispatcher::start(Arc::new(handler), config.workers).map_err(|err| err.to_string())?;

    let mut pending = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line.map_err(|err| format!("failed to read stdin: {err}"))?;
        let handle = dispatcher
            .submit(RawMessage::text(user, chat, line))
            .map_err(|err| err.to_string())?;
        pending.push(handle);
    }

    let mut ignored = 0;
    for handle in pending {
        if let Outcome::Ignored = handle.wait().map_err(|err| err.to_string())? {
            ignored += 1;
        }
    }
    dispatcher.shutdown();

    if ignored > 0 {
        eprintln!("{ignored} message(s) ignored: user {} is not authorized", user.0);
    }
    Ok(())
}

fn seed(config: &AppConfig, start: &str, days: u32) -> Result<(), String> {
    let start = NaiveDate::parse_from_str(start.trim(), &config.sheet.date_format)
        .map_err(|err| format!("invalid start date `{start}`: {err}"))?;
    let store = open_store(config)?;
    let units = config.valid_units().map_err(|err| err.to_string())?;
    let written = store
        .prepare_dates(&config.sheet, units.iter(), start, days)
        .map_err(|err| err.to_string())?;
    info!("event=cli_seed module=cli status=ok cells={written}");
    println!("seeded {written} date cells across {} unit(s)", units.len());
    Ok(())
}

fn report(config: &AppConfig, kind: ReportKind) -> Result<(), String> {
    let store = open_store(config)?;
    let units = config.valid_units().map_err(|err| err.to_string())?;
    let service = ReportService::new(Arc::new(store), config.sheet.clone(), units);
    let text = match kind {
        ReportKind::Daily => format_daily(
            &service
                .daily(LocalClock.today())
                .map_err(|err| err.to_string())?,
        ),
        ReportKind::Totals => format_totals(&service.totals().map_err(|err| err.to_string())?),
    };
    println!("{text}");
    Ok(())
}

fn show(config: &AppConfig, unit: &str, row: u32) -> Result<(), String> {
    let unit = Unit::parse(unit).ok_or_else(|| format!("invalid unit `{unit}`"))?;
    let store = open_store(config)?;
    let sheet = config.sheet.sheet_name(unit);
    let cells = store
        .row_cells(&sheet, row)
        .map_err(|err| err.to_string())?;
    if cells.is_empty() {
        println!("'{sheet}' row {row} is empty");
        return Ok(());
    }
    for (column, value) in cells {
        println!("'{sheet}'!{column}{row} = {value}");
    }
    Ok(())
}

fn open_store(config: &AppConfig) -> Result<SqliteStore, String> {
    let path = config
        .store_path
        .as_ref()
        .ok_or_else(|| "config has no `store_path`".to_string())?;
    SqliteStore::open(path).map_err(|err| format!("failed to open `{}`: {err}", path.display()))
}
