use anyhow::Result;
use owo_colors::OwoColorize;

use crate::app::App;

pub fn run(app: &mut App) -> Result<()> {
    let key = app.partition_key()?;
    let yes_no = |flag: bool| if flag { "yes".green().to_string() } else { "no".dimmed().to_string() };

    println!("Signed in:      {}", yes_no(app.session.is_authenticated()));
    println!("Google OAuth:   {}", yes_no(app.config.google.enabled()));
    println!("Guest mode:     {}", yes_no(app.session.guest_mode));
    println!("Partition:      {}", key);
    println!("Event file:     {}", app.ledger.store().path(&key).display().dimmed());
    println!("Time zone:      {}", app.ledger.time_zone());

    Ok(())
}
