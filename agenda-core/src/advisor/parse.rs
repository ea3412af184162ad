use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::Value;

use super::{Advice, RequestedEvent, Suggestion};
use crate::error::{AgendaError, AgendaResult};
use crate::event::{parse_date, parse_time};

const DEFAULT_TIME: &str = "09:00";
const DEFAULT_DURATION: u32 = 60;
const MIN_DURATION: u32 = 15;

/// Return the first balanced `{...}` span in `text`, skipping braces inside strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let candidate = &text[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;
    for (i, ch) in candidate.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&candidate[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct RawAdvice {
    requested_event: Option<RawRequested>,
    #[serde(default)]
    suggestions: Vec<RawSuggestion>,
}

#[derive(Debug, Deserialize)]
struct RawRequested {
    title: Option<String>,
    date: Option<String>,
    time: Option<String>,
    duration: Option<Value>,
    description: Option<String>,
    #[serde(default)]
    has_conflict: bool,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    date: Option<String>,
    time: Option<String>,
    duration: Option<Value>,
    #[serde(default)]
    reason: String,
}

fn malformed(message: impl Into<String>) -> AgendaError {
    AgendaError::AdvisorMalformedOutput(message.into())
}

pub(super) fn parse_advice(response: &str) -> AgendaResult<Advice> {
    let json = extract_json_object(response).ok_or_else(|| malformed("no JSON object in response"))?;
    let raw: RawAdvice = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;

    let requested = raw
        .requested_event
        .ok_or_else(|| malformed("missing requested_event"))?
        .normalize()?;

    let mut alternatives = raw
        .suggestions
        .into_iter()
        .map(RawSuggestion::normalize)
        .collect::<AgendaResult<Vec<_>>>()?;

    match alternatives.len() {
        0 => Ok(Advice::Single(requested)),
        n if n < 3 => Err(malformed(format!("expected 3 suggestions, got {n}"))),
        n => {
            if n > 3 {
                tracing::debug!(suggestions = n, "keeping the first 3 suggestions");
                alternatives.truncate(3);
            }
            let alternatives: [Suggestion; 3] = alternatives
                .try_into()
                .map_err(|_| malformed("expected 3 suggestions"))?;
            Ok(Advice::WithAlternatives {
                requested,
                alternatives,
            })
        }
    }
}

impl RawRequested {
    fn normalize(self) -> AgendaResult<RequestedEvent> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| malformed("requested_event has no title"))?;

        Ok(RequestedEvent {
            title,
            date: date(self.date)?,
            time: time(self.time)?,
            duration: duration(self.duration.as_ref())?,
            description: self.description.unwrap_or_default(),
            has_conflict: self.has_conflict,
        })
    }
}

impl RawSuggestion {
    fn normalize(self) -> AgendaResult<Suggestion> {
        Ok(Suggestion {
            date: date(self.date)?,
            time: time(self.time)?,
            duration: duration(self.duration.as_ref())?,
            reason: self.reason,
        })
    }
}

fn date(raw: Option<String>) -> AgendaResult<NaiveDate> {
    let raw = raw.ok_or_else(|| malformed("missing date"))?;
    parse_date(raw.trim()).map_err(|_| malformed(format!("unreadable date '{raw}'")))
}

fn time(raw: Option<String>) -> AgendaResult<NaiveTime> {
    let raw = raw
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TIME.to_string());
    parse_time(&raw).map_err(|_| malformed(format!("unreadable time '{raw}'")))
}

/// Minutes from a number or numeric string, at least [`MIN_DURATION`].
///
/// Only an absent or null value falls back to [`DEFAULT_DURATION`].
fn duration(raw: Option<&Value>) -> AgendaResult<u32> {
    let minutes = match raw {
        None | Some(Value::Null) => return Ok(DEFAULT_DURATION),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match minutes {
        Some(m) if m.is_finite() => Ok((m.round().clamp(0.0, f64::from(u32::MAX)) as u32).max(MIN_DURATION)),
        _ => Err(malformed(format!("unreadable duration '{}'", raw.map(Value::to_string).unwrap_or_default()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_from_prose() {
        let text = r#"Sure! {"a": {"b": "}"}} trailing {"c": 1}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": "}"}}"#));
    }

    #[test]
    fn test_extract_json_unbalanced() {
        assert_eq!(extract_json_object(r#"{"a": 1"#), None);
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn test_duration_normalization() {
        assert_eq!(duration(None).unwrap(), 60);
        assert_eq!(duration(Some(&json!(5))).unwrap(), 15);
        assert_eq!(duration(Some(&json!(-30))).unwrap(), 15);
        assert_eq!(duration(Some(&json!("90"))).unwrap(), 90);
        assert_eq!(duration(Some(&json!(null))).unwrap(), 60);
    }

    #[test]
    fn test_unreadable_duration_is_malformed() {
        assert!(matches!(
            duration(Some(&json!("about an hour"))),
            Err(AgendaError::AdvisorMalformedOutput(_))
        ));

        let result = parse_advice(
            r#"{"requested_event": {"title": "Call", "date": "2025-06-10", "time": "10:00", "duration": "about an hour"}}"#,
        );
        assert!(matches!(result, Err(AgendaError::AdvisorMalformedOutput(_))));
    }

    #[test]
    fn test_missing_time_defaults_to_nine() {
        let advice = parse_advice(r#"{"requested_event": {"title": "Call", "date": "2025-06-10", "time": null}}"#).unwrap();
        assert_eq!(advice.requested().time, parse_time("09:00").unwrap());
        assert_eq!(advice.requested().duration, 60);
    }

    #[test]
    fn test_missing_requested_event_is_malformed() {
        let result = parse_advice(r#"{"suggestions": []}"#);
        assert!(matches!(result, Err(AgendaError::AdvisorMalformedOutput(_))));
    }

    #[test]
    fn test_missing_date_is_malformed() {
        let result = parse_advice(r#"{"requested_event": {"title": "Call"}}"#);
        assert!(matches!(result, Err(AgendaError::AdvisorMalformedOutput(_))));
    }

    #[test]
    fn test_partial_suggestions_are_malformed() {
        let result = parse_advice(
            r#"{"requested_event": {"title": "Call", "date": "2025-06-10"},
                "suggestions": [{"date": "2025-06-11", "time": "10:00", "duration": 30, "reason": "free"}]}"#,
        );
        assert!(matches!(result, Err(AgendaError::AdvisorMalformedOutput(_))));
    }

    #[test]
    fn test_extra_suggestions_are_truncated() {
        let slot = r#"{"date": "2025-06-11", "time": "10:00", "duration": 30, "reason": "free"}"#;
        let response = format!(
            r#"{{"requested_event": {{"title": "Call", "date": "2025-06-10"}}, "suggestions": [{slot}, {slot}, {slot}, {slot}]}}"#
        );

        let advice = parse_advice(&response).unwrap();
        assert_eq!(advice.alternatives().len(), 3);
    }
}
