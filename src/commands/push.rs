use anyhow::Result;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::utils::tui;

pub async fn run(app: &mut App) -> Result<()> {
    let google = app.require_google().await?;
    let key = app.partition_key()?;

    let spinner = tui::create_spinner("Pushing to Google Calendar".to_string());
    let result = app.ledger.push(&key, &google).await;
    spinner.finish_and_clear();
    let report = result?;

    if report.synced == 0 {
        println!("{}", "Nothing to push".dimmed());
    } else {
        println!("Pushed {} {}", report.synced, if report.synced == 1 { "event" } else { "events" });
    }
    if report.skipped > 0 {
        println!("{}", format!("{} imported events left in place", report.skipped).dimmed());
    }

    Ok(())
}
