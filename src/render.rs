//! TUI rendering traits for agenda types.

use agenda_core::Event;
use agenda_core::advisor::{RequestedEvent, Suggestion};
use agenda_core::color;
use agenda_core::remote::RemoteEvent;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// A colored dot for a palette hex, plain when it can't be parsed.
fn swatch_dot(hex: &str) -> String {
    match rgb(hex) {
        Some((r, g, b)) => "●".truecolor(r, g, b).to_string(),
        None => "●".to_string(),
    }
}

fn rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

impl Render for Event {
    fn render(&self) -> String {
        let when = format!(
            "{} {} ({} min)",
            self.date.format("%Y-%m-%d"),
            self.time.format("%H:%M"),
            self.duration
        );
        let origin = if self.imported_from_google {
            format!(" {}", "[google]".cyan())
        } else {
            String::new()
        };
        let mut line = format!(
            "{} {} {}{}\n   {}",
            swatch_dot(&self.color),
            self.title.bold(),
            when.dimmed(),
            origin,
            self.id.to_string().dimmed()
        );
        if let Some(description) = &self.description {
            line.push_str(&format!("\n   {}", description));
        }
        line
    }
}

impl Render for RemoteEvent {
    fn render(&self) -> String {
        let dot = swatch_dot(
            self.color_id
                .as_deref()
                .map(color::to_local_hex)
                .unwrap_or(color::DEFAULT_HEX),
        );
        format!("{} {}", dot, self.describe())
    }
}

impl Render for RequestedEvent {
    fn render(&self) -> String {
        let conflict = if self.has_conflict {
            format!(" {}", "conflicts with your schedule".red())
        } else {
            String::new()
        };
        format!(
            "{} {} {} ({} min){}",
            self.title.bold(),
            self.date.format("%Y-%m-%d"),
            self.time.format("%H:%M"),
            self.duration,
            conflict
        )
    }
}

impl Render for Suggestion {
    fn render(&self) -> String {
        format!(
            "{} {} ({} min) {}",
            self.date.format("%Y-%m-%d"),
            self.time.format("%H:%M"),
            self.duration,
            self.reason.dimmed()
        )
    }
}
