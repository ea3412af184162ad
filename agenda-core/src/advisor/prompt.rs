use std::fmt::Write;

use chrono::{Datelike, Duration, NaiveDateTime, Weekday};

use crate::event::Event;
use crate::remote::RemoteEvent;

/// Days of remote calendar the advisor sees.
pub const CONTEXT_DAYS: i64 = 14;

/// Everything the advisor knows about the user's schedule.
#[derive(Debug, Clone)]
pub struct AdvisorContext {
    /// Local wall-clock time of the request.
    pub now: NaiveDateTime,
    pub local: Vec<Event>,
    pub remote: Vec<RemoteEvent>,
}

pub fn build_prompt(description: &str, context: &AdvisorContext) -> String {
    let today = context.now.date();
    let mut upcoming = String::new();
    for offset in 1..=CONTEXT_DAYS {
        let day = today + Duration::days(offset);
        let _ = writeln!(upcoming, "{} - {}", day.format("%Y-%m-%d"), day.format("%A"));
    }

    let mut schedule = String::new();
    for event in &context.local {
        let _ = writeln!(
            schedule,
            "- {} {} - {} ({} minutes)",
            event.date.format("%Y-%m-%d"),
            event.time.format("%H:%M"),
            event.title,
            event.duration
        );
    }
    for event in &context.remote {
        let _ = writeln!(schedule, "- {}", event.describe());
    }
    if schedule.is_empty() {
        schedule.push_str("(none)\n");
    }

    let tomorrow = today + Duration::days(1);
    let day_after = today + Duration::days(2);
    let next_wednesday = today + Duration::days(days_until(today.weekday(), Weekday::Wed));

    format!(
        r#"You are a calendar assistant. You read event descriptions and propose the best time slots.

TODAY
Date: {today}
Weekday: {weekday}
Current time: {time}

Upcoming days (use exactly these dates):
{upcoming}
Existing events:
{schedule}
TASK
The user wants to add: "{description}"

Resolving dates:
- "tomorrow" means {tomorrow}, "the day after tomorrow" means {day_after}.
- A weekday name means the nearest such date from the list above. For example, today is {weekday} {today}, so "on Wednesday" means {next_wednesday}.
- Never invent dates outside the list.

Rules:
1. The user may write in any language.
2. If the user gives a specific slot, check it against the existing events.
3. If it conflicts, propose 3 alternative slots.
4. If the user gives no slot, propose the 3 best free slots within the next 7 days.
5. Keep to reasonable hours (08:00-20:00).
6. Avoid weekends for work events.
7. Leave at least 30 minutes between events.

Answer with JSON in this shape:
{{
  "requested_event": {{
    "title": "name",
    "date": "YYYY-MM-DD",
    "time": "HH:MM",
    "duration": minutes,
    "description": "details",
    "has_conflict": true or false
  }},
  "suggestions": [
    {{
      "date": "YYYY-MM-DD",
      "time": "HH:MM",
      "duration": minutes,
      "reason": "why this slot works"
    }}
  ]
}}
"suggestions" holds either no entries or exactly 3.

Return ONLY the JSON, with no other text."#,
        today = today.format("%Y-%m-%d"),
        weekday = today.format("%A"),
        time = context.now.format("%H:%M"),
    )
}

/// Days from `from` to the next `target`, never zero.
fn days_until(from: Weekday, target: Weekday) -> i64 {
    let ahead = (i64::from(target.num_days_from_monday()) - i64::from(from.num_days_from_monday())).rem_euclid(7);
    if ahead == 0 { 7 } else { ahead }
}
