use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use super::errors::DischargeError;
use super::gateway::{CaseMutations, PathwayStore, TrackingSink};
use super::service::{DischargeReport, DischargeService};
use super::work_item::WorkItemPayload;

/// Queue entry: the activity payload keyed by the activity id it was created from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub reference: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItemResult {
    pub reference: String,
    pub status: WorkItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DischargeReport>,
    /// Reason handed to manual processing when the item failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl WorkItemResult {
    pub fn outcome_code(&self) -> &str {
        self.report
            .as_ref()
            .map(|report| report.outcome.code())
            .unwrap_or_default()
    }
}

/// Number of recent results a worker keeps when no capacity is given.
pub const DEFAULT_RESULT_CAPACITY: usize = 256;

/// Processes queue items one at a time; a failed item never stops the batch.
pub struct DischargeWorker<S, M, T> {
    service: Arc<DischargeService<S, M, T>>,
    processing: Mutex<()>,
    results: Mutex<VecDeque<WorkItemResult>>,
    capacity: usize,
}

impl<S, M, T> DischargeWorker<S, M, T>
where
    S: PathwayStore + 'static,
    M: CaseMutations + 'static,
    T: TrackingSink + 'static,
{
    pub fn new(service: Arc<DischargeService<S, M, T>>) -> Self {
        Self::with_capacity(service, DEFAULT_RESULT_CAPACITY)
    }

    /// Keep at most `capacity` results; the oldest are dropped first.
    pub fn with_capacity(service: Arc<DischargeService<S, M, T>>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            service,
            processing: Mutex::new(()),
            results: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn process_item(&self, item: &WorkItem, today: NaiveDate) -> WorkItemResult {
        let _running = self.processing.lock().expect("processing mutex poisoned");

        let result = match self.discharge(item, today) {
            Ok(report) => WorkItemResult {
                reference: item.reference.clone(),
                status: WorkItemStatus::Completed,
                report: Some(report),
                failure: None,
            },
            Err(err) => {
                error!(reference = %item.reference, error = %err, "work item failed, routing to manual processing");
                WorkItemResult {
                    reference: item.reference.clone(),
                    status: WorkItemStatus::Failed,
                    report: None,
                    failure: Some(err.to_string()),
                }
            }
        };

        let mut retained = self.results.lock().expect("results mutex poisoned");
        if retained.len() == self.capacity {
            retained.pop_front();
        }
        retained.push_back(result.clone());
        result
    }

    pub fn process_batch(&self, items: &[WorkItem], today: NaiveDate) -> Vec<WorkItemResult> {
        info!(items = items.len(), "processing work queue");
        items
            .iter()
            .map(|item| self.process_item(item, today))
            .collect()
    }

    /// The most recent results, oldest first.
    pub fn results(&self) -> Vec<WorkItemResult> {
        self.results
            .lock()
            .expect("results mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    fn discharge(&self, item: &WorkItem, today: NaiveDate) -> Result<DischargeReport, DischargeError> {
        let payload = WorkItemPayload::from_value(item.data.clone())?;
        self.service.process(&payload, today)
    }
}

#[derive(Debug, Serialize)]
struct WorkItemRow<'a> {
    reference: &'a str,
    status: WorkItemStatus,
    citizen: &'a str,
    provider: &'a str,
    outcome: &'a str,
    detail: &'a str,
    failed_sub_operations: usize,
    failure: &'a str,
}

/// Write one CSV row per result for the operations team's daily review.
pub fn write_results_csv<W: Write>(results: &[WorkItemResult], writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for result in results {
        let report = result.report.as_ref();
        writer.serialize(WorkItemRow {
            reference: &result.reference,
            status: result.status,
            citizen: report.map(|report| report.citizen.0.as_str()).unwrap_or_default(),
            provider: report.map(|report| report.provider.as_str()).unwrap_or_default(),
            outcome: result.outcome_code(),
            detail: report
                .map(|report| report.outcome_detail.as_str())
                .unwrap_or_default(),
            failed_sub_operations: report.map(|report| report.log.failures.len()).unwrap_or(0),
            failure: result.failure.as_deref().unwrap_or_default(),
        })?;
    }
    writer.flush()?;
    Ok(())
}
