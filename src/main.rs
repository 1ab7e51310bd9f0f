use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use ledger_engine::{
    category_totals, format_amount, init_tracing, month_summary, parse_amount_str, parse_kind,
    Config, Engine, Entry, Kind, Ledger, MonthKey, NewEntry,
};

#[derive(Parser, Debug)]
#[command(name = "ledger", version, about = "Personal expense/income ledger")]
struct Cli {
    /// Database file (overrides LEDGER_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record an expense or income
    Add {
        /// `expense` or `income`
        kind: String,
        /// Positive amount, e.g. 12.50
        #[arg(allow_negative_numbers = true)]
        amount: String,
        category: String,
        /// Optional free-form note (remaining words are joined)
        note: Vec<String>,
    },

    /// List all entries, newest first
    List,

    /// Show a single entry
    Show { id: i64 },

    /// Delete an entry by id
    Delete { id: i64 },

    /// Monthly reports
    Report {
        #[command(subcommand)]
        report: ReportCommand,
    },

    /// Dispatch one JSON request, e.g. '{"op":"list"}'
    Exec { request: String },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Income, expense and balance for a month
    Month {
        /// YYYY-MM (default: current UTC month)
        ym: Option<String>,
    },

    /// Totals per category for a month
    #[command(group(ArgGroup::new("which").args(["income", "expense", "both"])))]
    Category {
        /// YYYY-MM (default: current UTC month)
        ym: Option<String>,
        #[arg(long)]
        income: bool,
        #[arg(long)]
        expense: bool,
        #[arg(long)]
        both: bool,
    },
}

fn main() -> Result<()> {
    init_tracing("warn");
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    config
        .ensure_parent_dir()
        .context("Failed to create database directory")?;
    let ledger = Ledger::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    let engine = Engine::new(ledger).with_display_scale(config.display_scale);

    match cli.command {
        Command::Add {
            kind,
            amount,
            category,
            note,
        } => run_add(&engine, &kind, &amount, category, note)?,
        Command::List => run_list(&engine)?,
        Command::Show { id } => run_show(&engine, id)?,
        Command::Delete { id } => run_delete(&engine, id)?,
        Command::Report { report } => match report {
            ReportCommand::Month { ym } => run_month_report(&engine, ym)?,
            ReportCommand::Category {
                ym,
                income,
                expense: _,
                both,
            } => {
                let kinds: &[Kind] = if both {
                    &[Kind::Expense, Kind::Income]
                } else if income {
                    &[Kind::Income]
                } else {
                    &[Kind::Expense]
                };
                run_category_report(&engine, ym, kinds)?;
            }
        },
        Command::Exec { request } => {
            let response = engine.handle_json(&request);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Build a checked entry from command-line words; no note words means no note.
fn new_entry_from_args(kind: &str, amount: &str, category: String, note: &[String]) -> Result<NewEntry> {
    let new = NewEntry::new(parse_kind(kind)?, parse_amount_str(amount)?, category);
    if note.is_empty() {
        Ok(new)
    } else {
        Ok(new.with_note(note.join(" ")))
    }
}

fn run_add(engine: &Engine, kind: &str, amount: &str, category: String, note: Vec<String>) -> Result<()> {
    let new = new_entry_from_args(kind, amount, category, &note)?;
    let entry = engine.ledger().add_entry(new).context("Failed to add entry")?;
    println!("Entry added successfully. [{}]", entry.id);
    Ok(())
}

fn print_entry(entry: &Entry) {
    println!(
        "{}: {} {} {} {} [{}]",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        entry.kind.label(),
        entry.amount,
        entry.category,
        entry.note.as_deref().unwrap_or(""),
        entry.id
    );
}

fn run_list(engine: &Engine) -> Result<()> {
    let entries = engine.ledger().list().context("Failed to list entries")?;
    if entries.is_empty() {
        println!("(no entries)");
    }
    for entry in &entries {
        print_entry(entry);
    }
    Ok(())
}

fn run_show(engine: &Engine, id: i64) -> Result<()> {
    match engine.ledger().get(id).context("Failed to read entry")? {
        Some(entry) => print_entry(&entry),
        None => println!("No entry found with ID: {}", id),
    }
    Ok(())
}

fn run_delete(engine: &Engine, id: i64) -> Result<()> {
    if engine.ledger().delete(id).context("Failed to delete entry")? {
        println!("Entry deleted successfully.");
    } else {
        println!("No entry found with ID: {}", id);
    }
    Ok(())
}

fn resolve_month(engine: &Engine, ym: Option<String>) -> Result<MonthKey> {
    match ym {
        Some(raw) => Ok(raw.parse::<MonthKey>()?),
        None => Ok(MonthKey::current(engine.ledger().clock())),
    }
}

fn run_month_report(engine: &Engine, ym: Option<String>) -> Result<()> {
    let month = resolve_month(engine, ym)?;
    let scale = engine.display_scale();
    let summary = month_summary(engine.ledger(), &month)
        .context("Failed to get month summary")?
        .rounded(scale);

    println!("== Summary {} ==", summary.month);
    println!("Income : {}", format_amount(summary.income, scale));
    println!("Expense: {}", format_amount(summary.expense, scale));
    println!("Balance: {}", format_amount(summary.balance, scale));
    Ok(())
}

fn run_category_report(engine: &Engine, ym: Option<String>, kinds: &[Kind]) -> Result<()> {
    let month = resolve_month(engine, ym)?;
    let scale = engine.display_scale();

    for (i, kind) in kinds.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let rows = category_totals(engine.ledger(), &month, *kind)
            .context("Failed to get category totals")?;

        println!("== Category Totals ({}) {} ==", kind.label(), month);
        if rows.is_empty() {
            println!("(no data)");
        }
        for row in rows {
            println!("{:12} {}", row.category, format_amount(row.total, scale));
        }
    }
    Ok(())
}
