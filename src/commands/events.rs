use agenda_core::{EventDraft, EventId};
use anyhow::Result;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

pub async fn add(app: &mut App, draft: EventDraft) -> Result<()> {
    let key = app.partition_key()?;
    let event = app.ledger.create(&key, draft).await?;

    println!("{} {}", "+".green(), event.render());
    Ok(())
}

pub async fn list(app: &mut App) -> Result<()> {
    let key = app.partition_key()?;
    let events = app.ledger.list(&key).await?;

    if events.is_empty() {
        println!("{}", "No events".dimmed());
        return Ok(());
    }

    for event in &events {
        println!("{}", event.render());
    }
    Ok(())
}

pub async fn delete(app: &mut App, id: &str) -> Result<()> {
    let id: EventId = id.parse()?;
    let key = app.partition_key()?;
    let removed = app.ledger.delete(&key, id).await?;

    println!("{} {}", "-".red(), removed.title);
    Ok(())
}
