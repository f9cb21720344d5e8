//! On-demand backup response classification

use crate::platform::TriggerOutcome;

const FAILURE_BODY_LIMIT: usize = 200;

/// Classify the platform's answer to an on-demand backup mutation.
///
/// A 409, or a body saying a job is already running, means the platform
/// already has the work in hand. GraphQL reports most failures with a 200
/// status, so the `errors` array is checked as well.
pub fn classify_trigger_response(status: u16, body: &str) -> TriggerOutcome {
    let lowered = body.to_lowercase();
    let already_running = ["already", "in progress", "running"]
        .iter()
        .any(|needle| lowered.contains(needle));

    if status == 409 {
        return TriggerOutcome::AlreadyRunning;
    }

    if !matches!(status, 200 | 201 | 202 | 204) {
        if already_running {
            return TriggerOutcome::AlreadyRunning;
        }
        return TriggerOutcome::Failed(format!(
            "status {}: {}",
            status,
            truncate(body, FAILURE_BODY_LIMIT)
        ));
    }

    match graphql_errors(body) {
        None => TriggerOutcome::Triggered,
        Some(_) if already_running => TriggerOutcome::AlreadyRunning,
        Some(messages) => TriggerOutcome::Failed(truncate(&messages, FAILURE_BODY_LIMIT)),
    }
}

/// Joined `errors[].message` of a GraphQL body, None when there are none
fn graphql_errors(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let errors = value.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| e.get("message").and_then(|m| m.as_str()).unwrap_or("unknown error"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

pub(crate) fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let body = r#"{"data":{"createOnDemandSnapshot":{"id":"job-1","status":"QUEUED"}}}"#;
        assert_eq!(classify_trigger_response(200, body), TriggerOutcome::Triggered);
        assert_eq!(classify_trigger_response(202, ""), TriggerOutcome::Triggered);
    }

    #[test]
    fn test_conflict_is_already_running() {
        assert_eq!(classify_trigger_response(409, ""), TriggerOutcome::AlreadyRunning);
    }

    #[test]
    fn test_graphql_error_in_progress() {
        let body =
            r#"{"errors":[{"message":"A backup job is already in progress for this object"}]}"#;
        assert_eq!(classify_trigger_response(200, body), TriggerOutcome::AlreadyRunning);
    }

    #[test]
    fn test_graphql_error_is_failure() {
        let body = r#"{"errors":[{"message":"Object not found"}]}"#;
        assert_eq!(
            classify_trigger_response(200, body),
            TriggerOutcome::Failed("Object not found".to_string())
        );
    }

    #[test]
    fn test_server_error_truncates_body() {
        let body = "x".repeat(500);
        match classify_trigger_response(500, &body) {
            TriggerOutcome::Failed(detail) => {
                assert!(detail.starts_with("status 500: "));
                assert!(detail.len() < 230);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("short", 10), "short");
    }
}
