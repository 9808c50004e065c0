//! Selection of robot discharge activities from a Nexus activity list export.

use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::worker::WorkItem;

const NEXUS_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Which activities become work items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeRules {
    pub activity_name: String,
    pub active_status: String,
    pub lookback: Duration,
}

impl IntakeRules {
    pub fn standard() -> Self {
        Self::with_lookback_days(7)
    }

    pub fn with_lookback_days(days: i64) -> Self {
        Self {
            activity_name: "Robot - afslut borger".to_string(),
            active_status: "Aktiv".to_string(),
            lookback: Duration::days(days),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("activity list is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("activity list must be a JSON array")]
    NotAnArray,
}

pub fn parse_activity_list(raw: &str) -> Result<Vec<Value>, IntakeError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(IntakeError::NotAnArray),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, NEXUS_TIMESTAMP)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

fn activity_reference(entry: &Value) -> Option<String> {
    match entry.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Pick active robot discharge activities newer than the lookback window that are not
/// already queued. `is_queued` is asked once per candidate reference.
pub fn select_work_items<F>(
    entries: &[Value],
    now: DateTime<Utc>,
    rules: &IntakeRules,
    is_queued: F,
) -> Vec<WorkItem>
where
    F: Fn(&str) -> bool,
{
    let cutoff = now - rules.lookback;
    let mut seen = HashSet::new();

    entries
        .iter()
        .filter(|entry| entry.get("name").and_then(Value::as_str) == Some(rules.activity_name.as_str()))
        .filter(|entry| entry.get("status").and_then(Value::as_str) == Some(rules.active_status.as_str()))
        .filter(|entry| {
            let raw = entry.get("date").and_then(Value::as_str).unwrap_or_default();
            match parse_timestamp(raw) {
                Some(date) => date.with_timezone(&Utc) > cutoff,
                None => {
                    warn!(date = raw, "skipping activity with unreadable date");
                    false
                }
            }
        })
        .filter_map(|entry| {
            let reference = activity_reference(entry)?;
            if is_queued(&reference) || !seen.insert(reference.clone()) {
                debug!(%reference, "activity already queued");
                return None;
            }
            Some(WorkItem {
                reference,
                data: entry.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).single().expect("valid")
    }

    fn activity(id: u64, name: &str, status: &str, date: &str) -> Value {
        json!({ "id": id, "name": name, "status": status, "date": date })
    }

    #[test]
    fn selects_recent_active_robot_activities() {
        let entries = vec![
            activity(1, "Robot - afslut borger", "Aktiv", "2025-03-09T10:15:00.000+0100"),
            activity(2, "Robot - opret borger", "Aktiv", "2025-03-09T10:15:00.000+0100"),
            activity(3, "Robot - afslut borger", "Lukket", "2025-03-09T10:15:00.000+0100"),
            activity(4, "Robot - afslut borger", "Aktiv", "2025-02-20T10:15:00.000+0100"),
            activity(5, "Robot - afslut borger", "Aktiv", "2025-03-04T12:00:00.000+00:00"),
        ];

        let items = select_work_items(&entries, now(), &IntakeRules::standard(), |_| false);
        let references: Vec<&str> = items.iter().map(|item| item.reference.as_str()).collect();
        assert_eq!(references, vec!["1", "5"]);
        assert_eq!(items[0].data, entries[0]);
    }

    #[test]
    fn skips_already_queued_and_duplicate_references() {
        let entries = vec![
            activity(7, "Robot - afslut borger", "Aktiv", "2025-03-09T10:15:00.000+0100"),
            activity(8, "Robot - afslut borger", "Aktiv", "2025-03-09T11:15:00.000+0100"),
            activity(8, "Robot - afslut borger", "Aktiv", "2025-03-09T11:15:00.000+0100"),
        ];

        let items = select_work_items(&entries, now(), &IntakeRules::standard(), |reference| {
            reference == "7"
        });
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].reference, "8");
    }

    #[test]
    fn unreadable_dates_are_skipped() {
        let entries = vec![activity(9, "Robot - afslut borger", "Aktiv", "yesterday")];
        assert!(select_work_items(&entries, now(), &IntakeRules::standard(), |_| false).is_empty());
    }

    #[test]
    fn activity_list_must_be_an_array() {
        assert!(matches!(parse_activity_list("{}"), Err(IntakeError::NotAnArray)));
        assert_eq!(parse_activity_list("[]").expect("parses").len(), 0);
    }
}
