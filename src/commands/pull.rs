use anyhow::Result;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::utils::tui;

pub async fn run(app: &mut App) -> Result<()> {
    let google = app.require_google().await?;
    let key = app.partition_key()?;

    let spinner = tui::create_spinner("Pulling from Google Calendar".to_string());
    let result = app.ledger.pull(&key, &google).await;
    spinner.finish_and_clear();
    let report = result?;

    if report.imported == 0 {
        println!("{}", "Nothing new to import".dimmed());
    } else {
        println!("Imported {} {}", report.imported, if report.imported == 1 { "event" } else { "events" });
    }
    if report.duplicates > 0 {
        println!("{}", format!("{} already present", report.duplicates).dimmed());
    }
    if report.malformed > 0 {
        println!("{}", format!("{} unreadable events skipped", report.malformed).yellow());
    }

    Ok(())
}
