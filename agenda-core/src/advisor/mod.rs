//! Natural-language scheduling advisor.
//!
//! The advisor turns a free-text request ("dentist next Wednesday morning")
//! into a guessed event, optionally with three ranked alternative slots. The
//! language model sits behind [`Completion`]; this module owns the prompt,
//! the extraction of the structured answer and its normalization.

mod parse;
mod prompt;

use std::future::Future;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

pub use parse::extract_json_object;
pub use prompt::{AdvisorContext, CONTEXT_DAYS, build_prompt};

use crate::error::{AgendaError, AgendaResult};
use crate::event::EventDraft;

/// A single text-completion call.
pub trait Completion {
    fn complete(&self, prompt: &str) -> impl Future<Output = AgendaResult<String>> + Send;
}

/// The advisor's guess at what the user asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestedEvent {
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: u32,
    pub description: String,
    pub has_conflict: bool,
}

/// An alternative slot for the requested event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advice {
    Single(RequestedEvent),
    WithAlternatives {
        requested: RequestedEvent,
        alternatives: [Suggestion; 3],
    },
}

impl Advice {
    pub fn requested(&self) -> &RequestedEvent {
        match self {
            Advice::Single(requested) => requested,
            Advice::WithAlternatives { requested, .. } => requested,
        }
    }

    pub fn alternatives(&self) -> &[Suggestion] {
        match self {
            Advice::Single(_) => &[],
            Advice::WithAlternatives { alternatives, .. } => alternatives,
        }
    }

    /// Draft for the requested event as guessed.
    pub fn requested_draft(&self) -> EventDraft {
        let requested = self.requested();
        draft(requested, requested.date, requested.time, requested.duration)
    }

    /// Draft for alternative `n` (1-based), keeping the requested title and description.
    pub fn alternative_draft(&self, n: usize) -> AgendaResult<EventDraft> {
        let suggestion = n
            .checked_sub(1)
            .and_then(|i| self.alternatives().get(i))
            .ok_or_else(|| {
                AgendaError::InvalidEvent(format!(
                    "no alternative {n}, the advisor offered {}",
                    self.alternatives().len()
                ))
            })?;
        Ok(draft(
            self.requested(),
            suggestion.date,
            suggestion.time,
            suggestion.duration,
        ))
    }
}

fn draft(requested: &RequestedEvent, date: NaiveDate, time: NaiveTime, duration: u32) -> EventDraft {
    EventDraft {
        title: requested.title.clone(),
        date: date.format("%Y-%m-%d").to_string(),
        time: time.format("%H:%M").to_string(),
        duration,
        description: Some(requested.description.clone()).filter(|d| !d.is_empty()),
        color: None,
    }
}

pub struct Advisor<C> {
    completion: C,
}

impl<C: Completion> Advisor<C> {
    pub fn new(completion: C) -> Self {
        Advisor { completion }
    }

    /// Ask for a slot for `description`.
    ///
    /// One completion call per request. Output without a usable JSON object
    /// fails with [`AgendaError::AdvisorMalformedOutput`] and is not retried.
    pub async fn advise(&self, description: &str, context: &AdvisorContext) -> AgendaResult<Advice> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AgendaError::InvalidEvent("description cannot be empty".to_string()));
        }

        let prompt = build_prompt(description, context);
        let response = self.completion.complete(&prompt).await?;

        parse::parse_advice(&response).inspect_err(|e| {
            tracing::warn!(error = %e, response_len = response.len(), "advisor returned unusable output");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Canned {
        response: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn new(response: &str) -> Self {
            Canned {
                response: response.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl Completion for Canned {
        async fn complete(&self, prompt: &str) -> AgendaResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    fn context() -> AdvisorContext {
        AdvisorContext {
            now: "2025-06-09T10:30:00".parse().unwrap(),
            local: Vec::new(),
            remote: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_duration_gets_floor() {
        let advisor = Advisor::new(Canned::new(
            r#"{"requested_event": {"title": "Dentist", "date": "2025-06-11", "time": "08:00", "description": "", "has_conflict": false}}"#,
        ));

        let advice = advisor.advise("dentist on wednesday", &context()).await.unwrap();
        assert!(advice.requested().duration >= 15);
        assert!(advice.alternatives().is_empty());
    }

    #[tokio::test]
    async fn test_empty_description_is_rejected_without_a_call() {
        let canned = Canned::new("{}");
        let advisor = Advisor::new(canned);

        let result = advisor.advise("   ", &context()).await;
        assert!(matches!(result, Err(AgendaError::InvalidEvent(_))));
        assert_eq!(advisor.completion.calls(), 0);
    }

    #[tokio::test]
    async fn test_prose_only_response_is_malformed() {
        let advisor = Advisor::new(Canned::new("Sorry, I cannot help with that."));

        let result = advisor.advise("gym", &context()).await;
        assert!(matches!(result, Err(AgendaError::AdvisorMalformedOutput(_))));
    }

    #[tokio::test]
    async fn test_prompt_carries_request_and_dates() {
        let advisor = Advisor::new(Canned::new(
            r#"{"requested_event": {"title": "Gym", "date": "2025-06-10", "time": "18:00", "duration": 60}}"#,
        ));

        advisor.advise("gym tomorrow evening", &context()).await.unwrap();

        let prompts = advisor.completion.prompts.lock().unwrap();
        assert!(prompts[0].contains("gym tomorrow evening"));
        assert!(prompts[0].contains("2025-06-10 - Tuesday"));
    }

    #[tokio::test]
    async fn test_alternative_drafts() {
        let advisor = Advisor::new(Canned::new(
            r#"Here you go:
            {"requested_event": {"title": "Review", "date": "2025-06-10", "time": "14:00", "duration": 45, "description": "quarterly", "has_conflict": true},
             "suggestions": [
                {"date": "2025-06-10", "time": "15:00", "duration": 45, "reason": "free afternoon"},
                {"date": "2025-06-11", "time": "09:00", "duration": 45, "reason": "morning focus"},
                {"date": "2025-06-12", "time": "11:00", "duration": 45, "reason": "after standup"}
             ]}"#,
        ));

        let advice = advisor.advise("review", &context()).await.unwrap();
        assert!(advice.requested().has_conflict);

        let picked = advice.alternative_draft(2).unwrap();
        assert_eq!(picked.title, "Review");
        assert_eq!(picked.date, "2025-06-11");
        assert_eq!(picked.time, "09:00");
        assert_eq!(picked.description.as_deref(), Some("quarterly"));

        assert!(advice.alternative_draft(0).is_err());
        assert!(advice.alternative_draft(4).is_err());

        let requested = advice.requested_draft();
        assert_eq!(requested.time, "14:00");
        assert!(requested.into_event().is_ok());
    }
}
