use anyhow::{Context, Result, anyhow};
use bill_core::cache::{SqliteCache, SummaryCache, summary_key};
use bill_core::dates::{EventDate, FixedClock, parse_date};
use bill_core::{Bill, BillReport, ChamberTable, Classifier, MomentumResult, ProgressResult, Settings};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "billwatch")]
#[command(about = "Bill progress, momentum and trending classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify bills and print their reports as JSON
    Classify {
        /// JSON file holding one bill or an array of bills
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        opts: ClassifyOpts,
    },
    /// Render classified bills as markdown notes
    Notes {
        #[command(subcommand)]
        command: NotesCommands,
    },
    /// Export canonical JSON Schemas to the ./schemas directory
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Inspect or seed the bill summary cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(clap::Args)]
struct ClassifyOpts {
    /// Evaluation time (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long)]
    now: Option<String>,
    /// Directory holding classifier.toml and optionally chambers.yaml
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum NotesCommands {
    /// Write one note per bill plus index notes
    Build {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "vault")]
        out_dir: PathBuf,
        #[command(flatten)]
        opts: ClassifyOpts,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Store a summary for a bill title
    Put {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        summary: String,
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },
    /// Print the cached summary for a bill title, if still fresh
    Get {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        title: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { input, opts } => classify(&input, &opts),
        Commands::Notes { command } => match command {
            NotesCommands::Build {
                input,
                out_dir,
                opts,
            } => notes_build(&input, &out_dir, &opts),
        },
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
        Commands::Cache { command } => match command {
            CacheCommands::Put {
                db,
                title,
                summary,
                ttl_hours,
            } => cache_put(&db, &title, &summary, ttl_hours),
            CacheCommands::Get { db, title } => cache_get(&db, &title),
        },
    }
}

fn parse_now(raw: Option<&str>) -> Result<OffsetDateTime> {
    let Some(raw) = raw else {
        return Ok(OffsetDateTime::now_utc());
    };
    match parse_date(raw) {
        Some(EventDate::Instant(instant)) => Ok(instant),
        Some(EventDate::Day(date)) => Ok(date.midnight().assume_utc()),
        None => Err(anyhow!("Unrecognized --now value: {raw}")),
    }
}

fn load_bills(path: &Path) -> Result<Vec<Bill>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let bills: Vec<Bill> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(bills)
}

fn build_classifier(opts: &ClassifyOpts, now: OffsetDateTime) -> Result<Classifier> {
    let (settings, chambers) = match &opts.config_dir {
        Some(dir) => Settings::load_from_dir(dir)?,
        None => (Settings::default(), ChamberTable::default()),
    };
    Ok(Classifier::new(settings, chambers).with_clock(FixedClock(now)))
}

fn classify(input: &Path, opts: &ClassifyOpts) -> Result<()> {
    let bills = load_bills(input)?;
    let classifier = build_classifier(opts, parse_now(opts.now.as_deref())?)?;
    let reports = classifier.report_all(&bills);
    info!(bills = reports.len(), "classified bills");

    let json = if reports.len() == 1 {
        serde_json::to_string_pretty(&reports[0])?
    } else {
        serde_json::to_string_pretty(&reports)?
    };
    println!("{json}");
    Ok(())
}

fn notes_build(input: &Path, out_dir: &Path, opts: &ClassifyOpts) -> Result<()> {
    let bills = load_bills(input)?;
    let now = parse_now(opts.now.as_deref())?;
    let reports = build_classifier(opts, now)?.report_all(&bills);
    notes::build_notes(&reports, out_dir, now)?;
    println!("Wrote {} bill notes to {}", reports.len(), out_dir.display());
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let schemas = [
        ("Bill", schema_for!(Bill)),
        ("BillReport", schema_for!(BillReport)),
        ("ProgressResult", schema_for!(ProgressResult)),
        ("MomentumResult", schema_for!(MomentumResult)),
    ];
    for (name, schema) in schemas {
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    }

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}

fn cache_put(db: &Path, title: &str, summary: &str, ttl_hours: i64) -> Result<()> {
    let cache = SqliteCache::open(db)?;
    let key = summary_key(title);
    cache.set(&key, summary, time::Duration::hours(ttl_hours))?;
    println!("Cached summary for \"{key}\"");
    Ok(())
}

fn cache_get(db: &Path, title: &str) -> Result<()> {
    let cache = SqliteCache::open(db)?;
    match cache.get(&summary_key(title))? {
        Some(summary) => println!("{summary}"),
        None => println!("No cached summary for \"{}\"", summary_key(title)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use time::macros::datetime;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_now_values() {
        assert_eq!(
            parse_now(Some("2024-01-10")).unwrap(),
            datetime!(2024-01-10 00:00 UTC)
        );
        assert_eq!(
            parse_now(Some("2024-01-10T08:30:00Z")).unwrap(),
            datetime!(2024-01-10 08:30 UTC)
        );
        assert!(parse_now(Some("tomorrow")).is_err());
    }
}
