use anyhow::Result;
use owo_colors::OwoColorize;

use crate::app::{App, google_not_configured};

/// Drop any sign-in and continue as a fresh guest.
pub fn guest(app: &mut App) -> Result<()> {
    app.session.start_guest();
    let key = app.partition_key()?;

    println!("Continuing as guest ({})", key.to_string().dimmed());
    Ok(())
}

pub async fn login(app: &mut App) -> Result<()> {
    let Some((client_id, client_secret)) = app.config.google.client() else {
        anyhow::bail!("{}", google_not_configured());
    };

    let credentials = agenda_provider_google::auth::login(client_id, client_secret).await?;

    app.session.credentials = Some(credentials);
    app.session.guest_mode = false;
    let key = app.partition_key()?;
    app.save_session()?;

    println!("{} ({})", "Signed in with Google".green(), key.to_string().dimmed());
    Ok(())
}

/// Sign out. A guest's events are deleted; a signed-in user's stay on disk.
pub async fn logout(app: &mut App) -> Result<()> {
    let is_guest = app.session.credentials.is_none() && app.session.session_id.is_some();

    if is_guest {
        let key = app.partition_key()?;
        app.ledger.discard(&key).await?;
        tracing::info!(partition = %key, "discarded guest events");
    }

    app.session = Default::default();
    app.save_session()?;

    if is_guest {
        println!("Signed out, guest events deleted");
    } else {
        println!("Signed out");
    }
    Ok(())
}
