use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use expense_tracker::config;
use expense_tracker::{
    export_csv, logging, request_report, submit_expense, ExpenseInput, ExpenseStore, Money, Report,
    ReportOptions, SqliteStore, DATE_FORMAT, SUGGESTED_CATEGORIES,
};

#[derive(Parser)]
#[command(
    name = "expense-tracker",
    version = expense_tracker::VERSION,
    about = "Personal expense tracker: record expenses, compare against a budget, export CSV"
)]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true, env = config::DB_ENV)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new expense
    Add {
        /// Expense date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Food, Transport, Entertainment, Utilities, Other (or any label)
        #[arg(short, long, default_value = "Other")]
        category: String,
        /// Amount, e.g. 12.50
        #[arg(short, long, allow_hyphen_values = true)]
        amount: String,
        /// Free-text note
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show every recorded expense
    List,

    /// Totals, remaining budget, category distribution and monthly trend
    Report {
        /// Budget to compare against (not persisted)
        #[arg(short, long, env = config::BUDGET_ENV, value_parser = config::parse_budget)]
        budget: Option<Money>,
        /// Show months without expenses as zero
        #[arg(long)]
        fill_gaps: bool,
    },

    /// Write all expenses as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the suggested categories
    Categories,

    /// Launch the interactive dashboard
    #[command(alias = "tui")]
    Ui {
        /// Starting budget for the session
        #[arg(short, long, env = config::BUDGET_ENV, value_parser = config::parse_budget)]
        budget: Option<Money>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dashboard = matches!(cli.command, None | Some(Commands::Ui { .. }));
    logging::init_tracing(dashboard);

    let db_path = config::resolve_db_path(cli.db);

    // Startup cannot continue without a writable store
    let store = SqliteStore::open(&db_path).with_context(|| {
        format!(
            "cannot open expense database at {} (set --db or {})",
            db_path.display(),
            config::DB_ENV
        )
    })?;

    match cli.command {
        Some(Commands::Add {
            date,
            category,
            amount,
            description,
        }) => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive().format(DATE_FORMAT).to_string());
            let input = ExpenseInput::new(&date, &category, &amount, &description);
            let id = submit_expense(&store, &input).context("expense was not saved")?;
            println!("✓ Expense #{} added", id);
        }
        Some(Commands::List) => run_list(&store)?,
        Some(Commands::Report { budget, fill_gaps }) => {
            let budget = config::resolve_budget(budget)?;
            let report = request_report(&store, budget, ReportOptions { fill_month_gaps: fill_gaps })?;
            print_report(&report);
        }
        Some(Commands::Export { output }) => run_export(&store, output)?,
        Some(Commands::Categories) => {
            for category in SUGGESTED_CATEGORIES {
                println!("{}", category);
            }
        }
        Some(Commands::Ui { budget }) => run_ui_mode(&store, config::resolve_budget(budget)?)?,
        None => run_ui_mode(&store, config::resolve_budget(None)?)?,
    }

    Ok(())
}

fn run_list(store: &SqliteStore) -> Result<()> {
    let records = store.all_records()?;

    if records.is_empty() {
        println!("No expenses recorded yet.");
        return Ok(());
    }

    println!("{:>5}  {:<10}  {:<14}  {:>12}  {}", "ID", "Date", "Category", "Amount", "Description");
    for r in &records {
        println!(
            "{:>5}  {:<10}  {:<14}  {:>12}  {}",
            r.id,
            r.date.format(DATE_FORMAT),
            r.category,
            r.amount.to_string(),
            r.description
        );
    }
    println!("\n{} expenses", store.count()?);

    Ok(())
}

fn run_export(store: &SqliteStore, output: Option<PathBuf>) -> Result<()> {
    let records = store.all_records()?;

    match output {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
            export_csv(&records, file)?;
            eprintln!("✓ Exported {} expenses to {}", records.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            export_csv(&records, &mut lock)?;
            lock.flush()?;
        }
    }

    Ok(())
}

const BAR_WIDTH: usize = 30;

fn print_report(report: &Report) {
    if report.is_empty() {
        println!("No expenses recorded yet.");
        println!("Budget: {}", report.budget);
        return;
    }

    println!("Total Expenses:   {}", report.total);
    println!("Remaining Budget: {}", report.remaining);
    if report.over_budget {
        println!("⚠️  You have exceeded your budget of {}!", report.budget);
    }

    println!("\nExpense Distribution by Category");
    for share in &report.shares {
        println!(
            "  {:<14} {:>12} {:>6.1}%",
            share.category,
            share.total.to_string(),
            share.percent
        );
    }

    println!("\nMonthly Spending Trend");
    let max = report.by_month.iter().map(|m| m.total.cents()).max().unwrap_or(0);
    for month in &report.by_month {
        let width = if max > 0 {
            (month.total.cents().max(0) as f64 / max as f64 * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        println!("  {}  {:>12}  {}", month.label(), month.total.to_string(), "█".repeat(width));
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: &SqliteStore, budget: Money) -> Result<()> {
    expense_tracker::ui::run(store, budget)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: &SqliteStore, _budget: Money) -> Result<()> {
    eprintln!("❌ Dashboard not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: expense-tracker --help");
    std::process::exit(1);
}
