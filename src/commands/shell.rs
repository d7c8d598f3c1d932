//! Interactive session. Recovered rows live in a session accumulator
//! until the operator saves them to a table.

use crate::commands::batch::{BatchCommand, BatchMode};
use crate::commands::grab::GrabCommand;
use crate::config::Config;
use crate::reviews::accumulator::ReviewAccumulator;
use crate::store::ReviewStore;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const PROMPT: &str = "reviews> ";

const HELP: &str = "\
Commands:
  get <url>                  Extract reviews for a product review address
  save <table>               Persist accumulated rows to a table
  batch <auto|manual> <file> Run every address in a file (auto saves to 'default')
  tables                     List saved tables and their row counts
  csv <table>                Export a table to a timestamped CSV file
  help                       Show this message
  exit                       Leave the shell";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Get(String),
    Save(String),
    Batch(BatchMode, PathBuf),
    Tables,
    Csv(String),
    Help,
    Exit,
}

impl ShellCommand {
    /// Parses one input line. Unknown or malformed lines come back as
    /// an operator-facing message, never as a crash.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().ok_or_else(|| String::new())?;

        match verb {
            "get" => match tokens.next() {
                Some(url) => Ok(ShellCommand::Get(url.to_string())),
                None => Err("Usage: get <url>".to_string()),
            },
            "save" => match tokens.next() {
                Some(table) => Ok(ShellCommand::Save(table.to_string())),
                None => Err("Usage: save <table>".to_string()),
            },
            "batch" => {
                let mode = tokens
                    .next()
                    .ok_or_else(|| "Usage: batch <auto|manual> <file>".to_string())?
                    .parse::<BatchMode>()?;
                let file = tokens
                    .next()
                    .ok_or_else(|| "Usage: batch <auto|manual> <file>".to_string())?;
                Ok(ShellCommand::Batch(mode, PathBuf::from(file)))
            }
            "tables" => Ok(ShellCommand::Tables),
            "csv" => match tokens.next() {
                Some(table) => Ok(ShellCommand::Csv(table.to_string())),
                None => Err("Usage: csv <table>".to_string()),
            },
            "help" => Ok(ShellCommand::Help),
            "exit" | "quit" => Ok(ShellCommand::Exit),
            other => Err(format!("Unknown command: {other} (try 'help')")),
        }
    }
}

pub struct ShellSession {
    config: Config,
    cancel: Arc<AtomicBool>,
    acc: ReviewAccumulator,
}

impl ShellSession {
    pub fn new(config: Config, cancel: Arc<AtomicBool>) -> Self {
        Self { config, cancel, acc: ReviewAccumulator::new() }
    }

    /// Reads lines from stdin until `exit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        println!("review-grabber v{} (type 'help' for commands)", env!("CARGO_PKG_VERSION"));

        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            print!("{PROMPT}");
            std::io::stdout().flush()?;

            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            let command = match ShellCommand::parse(&line) {
                Ok(command) => command,
                Err(message) => {
                    if !message.is_empty() {
                        println!("{message}");
                    }
                    continue;
                }
            };

            // A Ctrl-C during the previous command must not poison this one.
            self.cancel.store(false, Ordering::Relaxed);

            if command == ShellCommand::Exit {
                break;
            }
            if let Err(err) = self.dispatch(command).await {
                println!("[!] {err:#}");
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Get(url) => {
                let grab = GrabCommand::new(self.config.clone());
                let report = grab.execute(&url, &mut self.acc, &self.cancel).await?;
                println!("{report}");
                println!("[i] {} rows accumulated", self.acc.len());
            }
            ShellCommand::Save(table) => {
                if self.acc.is_empty() {
                    println!("[!] Nothing to save");
                    return Ok(());
                }
                let mut store = ReviewStore::open(&self.config.db_path)?;
                let rows = self.acc.take();
                let saved = store.append(&table, &rows)?;
                println!("[+] Saved {saved} rows to table '{table}'");
            }
            ShellCommand::Batch(mode, file) => {
                let batch =
                    BatchCommand::new(self.config.clone(), mode, "default".to_string());
                let reports = batch.execute(&file, &mut self.acc, &self.cancel).await?;
                for report in reports {
                    println!("{report}");
                }
                if mode == BatchMode::Manual {
                    println!("[i] {} rows accumulated", self.acc.len());
                }
            }
            ShellCommand::Tables => {
                let store = ReviewStore::open(&self.config.db_path)?;
                let tables = store.tables()?;
                if tables.is_empty() {
                    println!("No tables yet");
                } else {
                    for (name, rows) in tables {
                        println!("{name}  ({rows} rows)");
                    }
                }
            }
            ShellCommand::Csv(table) => {
                let store = ReviewStore::open(&self.config.db_path)?;
                let path = store.export_csv(&table, std::path::Path::new("."))?;
                println!("[+] Wrote {}", path.display());
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Exit => unreachable!("handled by the loop"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get() {
        assert_eq!(
            ShellCommand::parse("get https://host/p/product-reviews/B01/ref=x"),
            Ok(ShellCommand::Get(
                "https://host/p/product-reviews/B01/ref=x".to_string()
            ))
        );
    }

    #[test]
    fn test_parse_get_without_url() {
        assert_eq!(ShellCommand::parse("get"), Err("Usage: get <url>".to_string()));
    }

    #[test]
    fn test_parse_save() {
        assert_eq!(
            ShellCommand::parse("  save wifi_routers  "),
            Ok(ShellCommand::Save("wifi_routers".to_string()))
        );
    }

    #[test]
    fn test_parse_batch() {
        assert_eq!(
            ShellCommand::parse("batch auto targets.txt"),
            Ok(ShellCommand::Batch(BatchMode::Auto, PathBuf::from("targets.txt")))
        );
        assert_eq!(
            ShellCommand::parse("batch manual /tmp/list"),
            Ok(ShellCommand::Batch(BatchMode::Manual, PathBuf::from("/tmp/list")))
        );
    }

    #[test]
    fn test_parse_batch_bad_mode() {
        assert!(ShellCommand::parse("batch sideways targets.txt").is_err());
    }

    #[test]
    fn test_parse_bare_words() {
        assert_eq!(ShellCommand::parse("tables"), Ok(ShellCommand::Tables));
        assert_eq!(ShellCommand::parse("help"), Ok(ShellCommand::Help));
        assert_eq!(ShellCommand::parse("exit"), Ok(ShellCommand::Exit));
        assert_eq!(ShellCommand::parse("quit"), Ok(ShellCommand::Exit));
    }

    #[test]
    fn test_parse_unknown() {
        let err = ShellCommand::parse("frobnicate").unwrap_err();
        assert!(err.contains("Unknown command"));
    }

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(ShellCommand::parse("   "), Err(String::new()));
    }
}
