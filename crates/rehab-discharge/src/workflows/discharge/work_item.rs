use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::domain::{CitizenId, EntityHandle};

/// Activity list entry stored on the queue: the robot task plus the citizen it concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemPayload {
    #[serde(deserialize_with = "deserialize_handle")]
    pub id: EntityHandle,
    /// Name of the provider whose course is being closed.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub patients: Vec<PatientEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEntry {
    pub patient_identifier: PatientIdentifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentifier {
    pub identifier: String,
}

impl WorkItemPayload {
    pub fn from_value(value: Value) -> Result<Self, WorkItemError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Provider name exactly as written on the activity; attribution matching is literal.
    pub fn provider(&self) -> Result<&str, WorkItemError> {
        self.description
            .as_deref()
            .filter(|provider| !provider.trim().is_empty())
            .ok_or(WorkItemError::MissingProvider)
    }

    pub fn citizen_id(&self) -> Result<CitizenId, WorkItemError> {
        self.patients
            .first()
            .map(|patient| patient.patient_identifier.identifier.trim())
            .filter(|identifier| !identifier.is_empty())
            .map(|identifier| CitizenId(identifier.to_string()))
            .ok_or(WorkItemError::MissingCitizen)
    }

    pub fn task_handle(&self) -> &EntityHandle {
        &self.id
    }
}

/// Nexus ids arrive as numbers while snapshot fixtures use strings; accept both.
fn deserialize_handle<'de, D>(deserializer: D) -> Result<EntityHandle, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(raw) => Ok(EntityHandle(raw)),
        Value::Number(number) => Ok(EntityHandle(number.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected task id as string or number, got {other}"
        ))),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkItemError {
    #[error("work item payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("work item has no provider description")]
    MissingProvider,
    #[error("work item has no patient identifier")]
    MissingCitizen,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numeric_id_and_first_patient() {
        let payload = WorkItemPayload::from_value(json!({
            "id": 48213,
            "name": "Robot - afslut borger",
            "description": "Fysioterapeuterne Syd",
            "patients": [{ "patientIdentifier": { "identifier": "0101011234" } }]
        }))
        .expect("payload parses");

        assert_eq!(payload.task_handle(), &EntityHandle::new("48213"));
        assert_eq!(payload.provider().expect("provider"), "Fysioterapeuterne Syd");
        assert_eq!(
            payload.citizen_id().expect("citizen"),
            CitizenId("0101011234".to_string())
        );
        assert_eq!(payload.extra.get("name"), Some(&json!("Robot - afslut borger")));
    }

    #[test]
    fn missing_fields_are_reported() {
        let payload = WorkItemPayload::from_value(json!({ "id": "task-1", "patients": [] }))
            .expect("payload parses");

        assert!(matches!(payload.provider(), Err(WorkItemError::MissingProvider)));
        assert!(matches!(payload.citizen_id(), Err(WorkItemError::MissingCitizen)));
    }

    #[test]
    fn provider_is_kept_verbatim() {
        let payload = WorkItemPayload::from_value(json!({
            "id": "task-1",
            "description": "Fysioterapeuterne Syd ",
        }))
        .expect("payload parses");
        assert_eq!(payload.provider().expect("provider"), "Fysioterapeuterne Syd ");

        let blank = WorkItemPayload::from_value(json!({ "id": "task-2", "description": "  " }))
            .expect("payload parses");
        assert!(matches!(blank.provider(), Err(WorkItemError::MissingProvider)));
    }

    #[test]
    fn rejects_payload_without_id() {
        let result = WorkItemPayload::from_value(json!({ "description": "Leverandør" }));
        assert!(matches!(result, Err(WorkItemError::Malformed(_))));
    }
}
