use agenda_core::remote;
use anyhow::Result;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

/// Show upcoming Google events without touching the local store.
pub async fn run(app: &mut App, days: i64) -> Result<()> {
    let google = app.require_google().await?;

    let window = remote::fetch_window_or_empty(Some(&google), days).await;

    if let Some(failure) = &window.failure {
        println!("{}", format!("Could not reach Google Calendar: {failure}").red());
        return Ok(());
    }
    if window.events.is_empty() {
        println!("{}", format!("Nothing scheduled in the next {days} days").dimmed());
        return Ok(());
    }

    for event in &window.events {
        println!("{}", event.render());
    }
    Ok(())
}
