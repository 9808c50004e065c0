use std::sync::Arc;

use serde_json::json;

use super::common::*;
use crate::workflows::discharge::domain::WorkflowState;
use crate::workflows::discharge::{
    write_results_csv, DischargeWorker, WorkItem, WorkItemStatus, DEFAULT_RESULT_CAPACITY,
};

#[test]
fn failed_item_does_not_stop_the_batch() {
    let mut case = snapshot(vec![grant_ref("i-1", "Genoptræning")]);
    case.interventions = vec![intervention("i-1", WorkflowState::Granted, PROVIDER)];
    let system = system(case);
    let worker = worker(&system);
    let items = vec![
        WorkItem {
            reference: "broken".to_string(),
            data: json!({ "description": PROVIDER }),
        },
        work_item("task-unknown-citizen", PROVIDER, "0202021234"),
        work_item(TASK, PROVIDER, CITIZEN),
    ];

    let results = worker.process_batch(&items, today());

    let statuses: Vec<_> = results.iter().map(|result| result.status).collect();
    assert_eq!(
        statuses,
        vec![
            WorkItemStatus::Failed,
            WorkItemStatus::Failed,
            WorkItemStatus::Completed,
        ]
    );
    assert!(results[0]
        .failure
        .as_deref()
        .is_some_and(|message| message.contains("malformed")));
    assert!(results[1]
        .failure
        .as_deref()
        .is_some_and(|message| message.contains("0202021234")));
    assert_eq!(results[2].outcome_code(), "");
    assert_eq!(worker.results().len(), 3);
}

#[test]
fn results_are_written_as_csv_rows() {
    let system = system(snapshot(vec![out_of_town_ref("i-ext")]));
    let worker = worker(&system);
    worker.process_item(&work_item(TASK, PROVIDER, CITIZEN), today());
    worker.process_item(&work_item("task-x", "", CITIZEN), today());

    let mut buffer = Vec::new();
    write_results_csv(&worker.results(), &mut buffer).expect("csv written");
    let csv = String::from_utf8(buffer).expect("utf-8");
    let lines: Vec<_> = csv.lines().collect();

    assert_eq!(
        lines[0],
        "reference,status,citizen,provider,outcome,detail,failed_sub_operations,failure"
    );
    assert!(lines[1].starts_with(&format!("{TASK},completed,{CITIZEN},{PROVIDER},Udenbys - Robot,")));
    assert!(lines[2].starts_with("task-x,failed,,,,,0,"));
    assert_eq!(lines.len(), 3);
}

#[test]
fn only_the_most_recent_results_are_retained() {
    let system = system(snapshot(Vec::new()));
    let worker = DischargeWorker::with_capacity(Arc::new(service(&system)), 2);

    for reference in ["task-a", "task-b", "task-c"] {
        worker.process_item(&work_item(reference, PROVIDER, CITIZEN), today());
    }

    let references: Vec<_> = worker
        .results()
        .into_iter()
        .map(|result| result.reference)
        .collect();
    assert_eq!(references, vec!["task-b".to_string(), "task-c".to_string()]);
}

#[test]
fn default_capacity_bounds_long_running_workers() {
    let system = system(snapshot(Vec::new()));
    let worker = worker(&system);
    let item = work_item("task-missing", PROVIDER, CITIZEN);

    for _ in 0..DEFAULT_RESULT_CAPACITY + 10 {
        worker.process_item(&item, today());
    }

    assert_eq!(worker.results().len(), DEFAULT_RESULT_CAPACITY);
}
