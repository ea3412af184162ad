mod anthropic;
mod app;
mod commands;
mod render;
mod session;
mod utils;

use agenda_core::{AgendaError, EventDraft};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::commands::advise::Accept;

#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "Keep a local agenda and reconcile it with Google Calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Continue without signing in; guest events are deleted on logout
    Guest,
    /// Sign in with Google
    Login,
    Logout,
    Status,
    /// Add an event
    Add {
        title: String,

        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Start time (HH:MM)
        #[arg(short, long)]
        time: String,

        /// Length in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,

        #[arg(long)]
        description: Option<String>,

        /// Palette hex (e.g. "#0f9d58") or name (e.g. "green")
        #[arg(short, long)]
        color: Option<String>,
    },
    /// List local events
    List,
    /// Delete a local event by id
    Delete { id: String },
    /// Import the next 90 days of Google events
    Pull,
    /// Export local events to Google, then drop them locally
    Push,
    /// Show upcoming Google events without importing them
    Remote {
        #[arg(long, default_value_t = commands::DISPLAY_DAYS, value_parser = clap::value_parser!(i64).range(1..=365))]
        days: i64,
    },
    /// Ask the scheduling advisor for a slot
    Advise {
        /// What you want to schedule, in your own words
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        /// Add the requested event as guessed
        #[arg(long, conflicts_with = "pick")]
        add: bool,

        /// Add alternative N (1-3) instead
        #[arg(long)]
        pick: Option<usize>,

        /// Print the advice as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;

    let auth_required = result
        .as_ref()
        .err()
        .and_then(|e| e.downcast_ref::<AgendaError>())
        .is_some_and(|e| matches!(e, AgendaError::AuthRequired));
    if auth_required {
        eprintln!("Google Calendar needs you to sign in again:\n  agenda login\n");
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut app = App::load()?;

    match cli.command {
        Commands::Guest => commands::auth::guest(&mut app),
        Commands::Login => commands::auth::login(&mut app).await,
        Commands::Logout => commands::auth::logout(&mut app).await,
        Commands::Status => commands::status::run(&mut app),
        Commands::Add {
            title,
            date,
            time,
            duration,
            description,
            color,
        } => {
            let draft = EventDraft {
                title,
                date,
                time,
                duration,
                description,
                color,
            };
            commands::events::add(&mut app, draft).await
        }
        Commands::List => commands::events::list(&mut app).await,
        Commands::Delete { id } => commands::events::delete(&mut app, &id).await,
        Commands::Pull => commands::pull::run(&mut app).await,
        Commands::Push => commands::push::run(&mut app).await,
        Commands::Remote { days } => commands::remote::run(&mut app, days).await,
        Commands::Advise {
            description,
            add,
            pick,
            json,
        } => {
            let accept = match (add, pick) {
                (_, Some(n)) => Accept::Alternative(n),
                (true, None) => Accept::Requested,
                (false, None) => Accept::Nothing,
            };
            commands::advise::run(&mut app, &description.join(" "), accept, json).await
        }
    }
}
