use agenda_core::advisor::{Advice, Advisor, AdvisorContext, CONTEXT_DAYS};
use agenda_core::remote;
use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;

use crate::anthropic::Anthropic;
use crate::app::App;
use crate::render::Render;

/// What to do with the advice once it arrives.
pub enum Accept {
    Nothing,
    Requested,
    Alternative(usize),
}

pub async fn run(app: &mut App, description: &str, accept: Accept, json: bool) -> Result<()> {
    let Some(completion) = Anthropic::from_config(&app.config.advisor)? else {
        anyhow::bail!(
            "The scheduling advisor is not configured.\n\n\
            Set ANTHROPIC_API_KEY, or add to ~/.config/agenda/config.toml:\n\n\
            [advisor]\n\
            api_key = \"sk-ant-...\""
        );
    };

    let key = app.partition_key()?;
    let local = app.ledger.list(&key).await?;

    // Calendar context is best effort
    let google = if app.config.google.enabled() {
        app.google().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "continuing without Google Calendar context");
            None
        })
    } else {
        None
    };
    let window = remote::fetch_window_or_empty(google.as_ref(), CONTEXT_DAYS).await;
    if let Some(failure) = &window.failure {
        eprintln!("{}", format!("Google Calendar unavailable, advising without it: {failure}").dimmed());
    }

    let context = AdvisorContext {
        now: Utc::now().with_timezone(&app.ledger.time_zone()).naive_local(),
        local,
        remote: window.events,
    };

    let advice = Advisor::new(completion).advise(description, &context).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&advice)?);
    } else {
        print_advice(&advice);
    }

    let draft = match accept {
        Accept::Nothing => return Ok(()),
        Accept::Requested => advice.requested_draft(),
        Accept::Alternative(n) => advice.alternative_draft(n)?,
    };

    let event = app.ledger.create(&key, draft).await?;
    println!("\n{} {}", "+".green(), event.render());
    Ok(())
}

fn print_advice(advice: &Advice) {
    println!("{}", advice.requested().render());
    if !advice.requested().description.is_empty() {
        println!("   {}", advice.requested().description);
    }

    if !advice.alternatives().is_empty() {
        println!("\n{}", "Alternatives:".bold());
        for (i, suggestion) in advice.alternatives().iter().enumerate() {
            println!("  {}. {}", i + 1, suggestion.render());
        }
    }
}
