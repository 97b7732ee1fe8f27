//! # Event Normalizer
//!
//! Turns raw queue message bodies into canonical [`Event`] records. Payloads
//! arrive in heterogeneous JSON shapes from several producers, so decoding is
//! tolerant: every field is optional and defaulted. A body that is not a JSON
//! object drops the message entirely; the caller must skip it without
//! deleting it from the queue, letting the queue's own redrive policy route
//! it to a DLQ.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::constants::{EVENT_AVATAR, MISSING_FIELD, UNKNOWN_SERVICE};
use crate::model::{Event, EventStatus};

/// Tolerant decode target for a raw message body.
#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    event_source: Option<String>,
    #[serde(default)]
    payload: RawPayload,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPayload {
    #[serde(default)]
    linkedin_identifier: Option<String>,
    /// Producers send this as either a JSON number or a string.
    #[serde(default)]
    job_id: Option<serde_json::Value>,
    #[serde(default)]
    original_input: Option<String>,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    source: Option<String>,
}

/// Normalize one raw message body into an [`Event`].
///
/// Returns `None` when the body does not decode as a JSON object; the
/// message must then be left un-deleted for redelivery.
pub fn normalize(body: &str, now: DateTime<Utc>) -> Option<Event> {
    let envelope: RawEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "Dropping message with undecodable body");
            return None;
        }
    };

    let service = envelope
        .event_source
        .unwrap_or_else(|| UNKNOWN_SERVICE.to_string());
    let message = build_message(&service, &envelope.payload);
    let timestamp = display_time(envelope.timestamp.as_deref(), now);

    Some(Event {
        timestamp,
        service,
        status: EventStatus::Ok,
        message,
        avatar: EVENT_AVATAR.to_string(),
    })
}

/// Classify by substring match on the event source, first match wins.
fn build_message(service: &str, payload: &RawPayload) -> String {
    let profile = payload
        .linkedin_identifier
        .as_deref()
        .unwrap_or(MISSING_FIELD);

    if service.contains("preparation-requested") {
        let source = payload.metadata.source.as_deref().unwrap_or(MISSING_FIELD);
        format!("Preparation requested for {profile} from {source}")
    } else if service.contains("completed") {
        let job_id = display_value(payload.job_id.as_ref());
        format!("Profile analysis complete for {profile} (job {job_id})")
    } else if service.contains("events") {
        let job_id = display_value(payload.job_id.as_ref());
        let input = payload.original_input.as_deref().unwrap_or(MISSING_FIELD);
        format!("Event for {profile}: job {job_id}, input {input}")
    } else {
        format!("Received event from {service}")
    }
}

/// Render a JSON scalar without surrounding quotes.
fn display_value(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => MISSING_FIELD.to_string(),
    }
}

/// Parse an ISO-8601 timestamp (`Z` suffix normalized to an explicit offset)
/// and render it as `HH:MM:SS` UTC; fall back to `now` when absent or
/// unparseable.
fn display_time(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let parsed = raw
        .map(|ts| ts.replace('Z', "+00:00"))
        .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(now);
    parsed.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 34, 56).unwrap()
    }

    #[test]
    fn completed_message_carries_profile_and_job_id() {
        let body = r#"{"event_source":"x-completed","payload":{"linkedin_identifier":"abc","job_id":"42"}}"#;
        let event = normalize(body, fixed_now()).expect("valid body");

        assert!(event.message.contains("abc"));
        assert!(event.message.contains("42"));
        assert_eq!(event.status, EventStatus::Ok);
        assert_eq!(event.service, "x-completed");
    }

    #[test]
    fn numeric_job_id_renders_without_quotes() {
        let body = r#"{"event_source":"x-completed","payload":{"job_id":42}}"#;
        let event = normalize(body, fixed_now()).unwrap();
        assert!(event.message.contains("job 42"));
        assert!(event.message.contains(MISSING_FIELD), "missing profile defaults");
    }

    #[test]
    fn preparation_requested_uses_metadata_source() {
        let body = r#"{"event_source":"profile-preparation-requested","payload":{"linkedin_identifier":"jane-doe","metadata":{"source":"crm-import"}}}"#;
        let event = normalize(body, fixed_now()).unwrap();
        assert!(event.message.contains("jane-doe"));
        assert!(event.message.contains("crm-import"));
    }

    #[test]
    fn events_source_uses_job_id_and_original_input() {
        let body = r#"{"event_source":"analysis-events","payload":{"job_id":7,"original_input":"https://example.com/p/1"}}"#;
        let event = normalize(body, fixed_now()).unwrap();
        assert!(event.message.contains("job 7"));
        assert!(event.message.contains("https://example.com/p/1"));
    }

    #[test]
    fn unmatched_source_falls_back_to_generic_message() {
        let body = r#"{"event_source":"billing-service","payload":{}}"#;
        let event = normalize(body, fixed_now()).unwrap();
        assert_eq!(event.message, "Received event from billing-service");
    }

    #[test]
    fn missing_event_source_defaults_to_unknown_service() {
        let event = normalize("{}", fixed_now()).unwrap();
        assert_eq!(event.service, UNKNOWN_SERVICE);
        assert_eq!(event.timestamp, "12:34:56");
    }

    #[test]
    fn malformed_json_drops_the_message() {
        assert!(normalize("not json at all", fixed_now()).is_none());
        assert!(normalize("", fixed_now()).is_none());
    }

    #[test]
    fn non_object_json_drops_the_message() {
        assert!(normalize(r#""just a string""#, fixed_now()).is_none());
        assert!(normalize("42", fixed_now()).is_none());
    }

    #[test]
    fn zulu_timestamp_is_normalized_and_reformatted() {
        let body = r#"{"timestamp":"2024-05-17T08:01:02Z"}"#;
        let event = normalize(body, fixed_now()).unwrap();
        assert_eq!(event.timestamp, "08:01:02");
    }

    #[test]
    fn offset_timestamp_is_converted_to_utc() {
        let body = r#"{"timestamp":"2024-05-17T10:01:02+02:00"}"#;
        let event = normalize(body, fixed_now()).unwrap();
        assert_eq!(event.timestamp, "08:01:02");
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_now() {
        let body = r#"{"timestamp":"yesterday-ish"}"#;
        let event = normalize(body, fixed_now()).unwrap();
        assert_eq!(event.timestamp, "12:34:56");
    }
}
