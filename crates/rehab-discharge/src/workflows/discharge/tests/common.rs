use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};

use crate::workflows::discharge::domain::{
    ActivityLink, AuditEntry, Citizen, CitizenId, EntityHandle, Form, FormStatus, Intervention,
    Loan, OrganizationalRelation, Reference, ReferenceKind, Task, TaskStatus, WorkflowState,
};
use crate::workflows::discharge::memory::{
    CaseSnapshot, CitizenRecord, FormRecord, InMemoryCaseSystem,
};
use crate::workflows::discharge::{
    DischargePolicy, DischargeRuleEngine, DischargeService, DischargeWorker, WorkItem,
};

pub(super) const PROVIDER: &str = "Fysioterapeuterne Vest";
pub(super) const CITIZEN: &str = "0101011234";
pub(super) const TASK: &str = "task-48213";

pub(super) type Engine = DischargeRuleEngine<InMemoryCaseSystem, InMemoryCaseSystem>;
pub(super) type Service = DischargeService<InMemoryCaseSystem, InMemoryCaseSystem, InMemoryCaseSystem>;
pub(super) type Worker = DischargeWorker<InMemoryCaseSystem, InMemoryCaseSystem, InMemoryCaseSystem>;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
}

pub(super) fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, day, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn segments(path: &[&str]) -> Vec<String> {
    path.iter().map(|segment| segment.to_string()).collect()
}

const INTERVENTIONS: [&str; 3] = ["Sundhedsfagligt grundforløb", "FSIII", "Indsatser"];
const FORMS: [&str; 2] = ["Sundhedsfagligt grundforløb", "FSIII"];

pub(super) fn grant_ref(handle: &str, name: &str) -> Reference {
    Reference {
        handle: EntityHandle::new(handle),
        path: segments(&INTERVENTIONS),
        name: name.to_string(),
        kind: ReferenceKind::Intervention,
        status: None,
        date: None,
        active_pathway: true,
    }
}

pub(super) fn out_of_town_ref(handle: &str) -> Reference {
    grant_ref(handle, "Genoptræning udenbys borger (SUL § 140)")
}

pub(super) fn placement_ref(handle: &str) -> Reference {
    Reference {
        path: segments(&[
            "ÆHF - Forløbsindplacering (Grundforløb)",
            "Forløbsindplacering",
            "Indsatser",
        ]),
        ..grant_ref(handle, "Forløbsindplacering")
    }
}

pub(super) fn form_ref(handle: &str, name: &str, status: FormStatus, day: u32) -> Reference {
    Reference {
        handle: EntityHandle::new(handle),
        path: segments(&FORMS),
        name: name.to_string(),
        kind: ReferenceKind::Form,
        status: Some(status.label().to_string()),
        date: Some(at(day)),
        active_pathway: true,
    }
}

pub(super) fn intervention(handle: &str, state: WorkflowState, provider: &str) -> Intervention {
    Intervention {
        handle: EntityHandle::new(handle),
        name: "Genoptræning efter SUL § 140".to_string(),
        workflow_state: state,
        provider: Some(provider.to_string()),
    }
}

/// Form whose audit history lists `authors` (organization, day of February) in the given order.
pub(super) fn form_record(
    handle: &str,
    name: &str,
    authors: &[(&str, u32)],
    activities: &[&str],
) -> FormRecord {
    FormRecord {
        form: Form {
            handle: EntityHandle::new(handle),
            name: name.to_string(),
            status: FormStatus::Active,
            date: Some(at(1)),
        },
        history: authors
            .iter()
            .map(|(organization, day)| AuditEntry {
                date: at(*day),
                organization: Some(organization.to_string()),
            })
            .collect(),
        activities: activities
            .iter()
            .map(|handle| ActivityLink {
                handle: EntityHandle::new(*handle),
                name: None,
            })
            .collect(),
    }
}

pub(super) fn citizen() -> Citizen {
    Citizen {
        id: CitizenId(CITIZEN.to_string()),
        handle: EntityHandle::new("patients/1"),
        name: Some("Test Borger".to_string()),
    }
}

pub(super) fn relation(handle: &str, organization: &str) -> OrganizationalRelation {
    OrganizationalRelation {
        handle: EntityHandle::new(handle),
        organization: organization.to_string(),
    }
}

pub(super) fn loan(handle: &str, grant: &str) -> Loan {
    Loan {
        handle: EntityHandle::new(handle),
        grant: Some(grant.to_string()),
    }
}

/// One citizen with the given pathway, plus the open originating task.
pub(super) fn snapshot(pathway: Vec<Reference>) -> CaseSnapshot {
    CaseSnapshot {
        citizens: vec![CitizenRecord {
            citizen: citizen(),
            pathway: Some(pathway),
            relations: Vec::new(),
            loans: Vec::new(),
        }],
        interventions: Vec::new(),
        forms: Vec::new(),
        tasks: vec![Task {
            handle: EntityHandle::new(TASK),
            title: "Robot - afslut borger".to_string(),
            status: TaskStatus::Open,
        }],
    }
}

pub(super) fn system(snapshot: CaseSnapshot) -> Arc<InMemoryCaseSystem> {
    Arc::new(InMemoryCaseSystem::from_snapshot(snapshot))
}

pub(super) fn engine(system: &Arc<InMemoryCaseSystem>) -> Engine {
    DischargeRuleEngine::new(
        system.clone(),
        system.clone(),
        Arc::new(DischargePolicy::standard()),
    )
}

pub(super) fn service(system: &Arc<InMemoryCaseSystem>) -> Service {
    DischargeService::new(
        system.clone(),
        system.clone(),
        system.clone(),
        DischargePolicy::standard(),
    )
}

pub(super) fn worker(system: &Arc<InMemoryCaseSystem>) -> Worker {
    DischargeWorker::new(Arc::new(service(system)))
}

pub(super) fn payload(task: &str, provider: &str, citizen: &str) -> Value {
    json!({
        "id": task,
        "name": "Robot - afslut borger",
        "description": provider,
        "patients": [{ "patientIdentifier": { "identifier": citizen } }]
    })
}

pub(super) fn work_item(task: &str, provider: &str, citizen: &str) -> WorkItem {
    WorkItem {
        reference: task.to_string(),
        data: payload(task, provider, citizen),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
