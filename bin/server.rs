// Expense Tracker - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use expense_tracker::config::{self, Config};
use expense_tracker::server::{router, AppState};
use expense_tracker::{logging, ExpenseStore, Money, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "expense-server", version = expense_tracker::VERSION, about = "REST API for the expense tracker")]
struct Args {
    /// Path to the SQLite database
    #[arg(long, env = config::DB_ENV)]
    db: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = config::ADDR_ENV)]
    addr: Option<String>,

    /// Budget used when a report request does not pass one
    #[arg(long, env = config::BUDGET_ENV, value_parser = config::parse_budget)]
    budget: Option<Money>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing(false);

    let args = Args::parse();
    let config = Config::resolve(args.db, args.budget, args.addr)?;

    // Fatal: nothing can be served without the table
    let store = SqliteStore::open(&config.db_path).with_context(|| {
        format!("cannot open expense database at {}", config.db_path.display())
    })?;
    tracing::info!(
        path = %config.db_path.display(),
        expenses = store.count()?,
        "database opened"
    );

    let app = router(AppState {
        store: Arc::new(store),
        default_budget: config.budget,
    });

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;

    tracing::info!("listening on http://{}", config.server_addr);
    println!("🚀 Server running on http://{}", config.server_addr);
    println!("   API: http://{}/api/expenses", config.server_addr);
    println!("   Press Ctrl+C to stop");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
