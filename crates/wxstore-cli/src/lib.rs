use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use wxstore_config::{delimiter_byte, AppConfig};
use wxstore_core::{FieldValue, TableSchema};
use wxstore_db::DataStore;
use wxstore_ingest::{export_csv, import_csv, CsvOptions};

#[derive(Debug, Parser)]
#[command(name = "wxstore", version, about = "Weather observation store")]
pub struct Cli {
    /// Configuration file (defaults to $WXSTORE_CONFIG or ./config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overrides the configuration
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Weather table name, overrides the configuration
    #[arg(long, global = true)]
    pub table: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the weather table if it does not exist
    Init,
    /// Drop the weather table
    Drop,
    /// Load a delimited station file into the weather table
    Import {
        file: PathBuf,
        /// Field delimiter, overrides the configuration
        #[arg(long)]
        delimiter: Option<char>,
    },
    /// Write the whole weather table as CSV or JSON
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a SELECT and print rows as JSON arrays
    Query {
        sql: String,
        /// Bound parameter, repeatable, in placeholder order
        #[arg(long = "param")]
        params: Vec<String>,
        /// Print only the first row
        #[arg(long)]
        one: bool,
    },
    /// Run a DELETE statement
    Delete { sql: String },
    /// Print the number of rows in the weather table
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Load the configuration named on the command line, or the default one
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => AppConfig::load().context("Failed to load config"),
    }
}

/// Execute one command, writing its output to `out`
pub fn run(cli: &Cli, cfg: &AppConfig, out: &mut dyn Write) -> Result<()> {
    let db_path = cli.db.clone().unwrap_or_else(|| cfg.db_path());
    let schema = TableSchema::weather(cli.table.clone().unwrap_or_else(|| cfg.table()));
    let mut store = DataStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    tracing::debug!(command = ?cli.command, table = %schema.name, "running command");

    match &cli.command {
        Command::Init => {
            store.create_weather_table(&schema)?;
            writeln!(out, "table {} ready", schema.name)?;
        }
        Command::Drop => {
            store.drop_weather_table(&schema)?;
            writeln!(out, "table {} dropped", schema.name)?;
        }
        Command::Import { file, delimiter } => {
            let delimiter = match delimiter {
                Some(c) => delimiter_byte(*c)?,
                None => cfg.delimiter()?,
            };
            let report = import_csv(&mut store, &schema, file, &CsvOptions { delimiter })
                .with_context(|| format!("Failed to import {}", file.display()))?;
            writeln!(out, "{}", serde_json::to_string(&report)?)?;
        }
        Command::Export { format, output } => {
            let frame = store.load_frame(&schema)?;
            let mut sink: Box<dyn Write + '_> = match output {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?,
                )),
                None => Box::new(&mut *out),
            };
            match format {
                ExportFormat::Csv => {
                    let options = CsvOptions {
                        delimiter: cfg.delimiter()?,
                    };
                    export_csv(&frame, &mut sink, &options)?;
                }
                ExportFormat::Json => {
                    serde_json::to_writer(&mut sink, &frame)?;
                    writeln!(sink)?;
                }
            }
            sink.flush()?;
        }
        Command::Query { sql, params, one } => {
            let params: Vec<FieldValue> = params.iter().map(|p| FieldValue::infer(p)).collect();
            if *one {
                let row = store.query_one(sql, &params)?;
                writeln!(out, "{}", serde_json::to_string(&row)?)?;
            } else {
                for row in store.query_many(sql, &params)? {
                    writeln!(out, "{}", serde_json::to_string(&row)?)?;
                }
            }
        }
        Command::Delete { sql } => {
            let deleted = store.delete(sql)?;
            writeln!(out, "deleted {deleted} rows")?;
        }
        Command::Count => {
            writeln!(out, "{}", store.count_rows(&schema)?)?;
        }
    }
    Ok(())
}
