use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{EntityHandle, PathwayTree, TaskDraft, TaskStatus};
use super::errors::DischargeError;
use super::gateway::{CaseMutations, PathwayStore, TrackingSink};
use super::outcome::DischargeOutcome;
use super::policy::DischargePolicy;

/// What finalizing a work item did to the originating task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinalizeSummary {
    pub collaboration_task: Option<EntityHandle>,
    pub task_closed: bool,
    /// The originating task was closed before this run reached it (redelivered item).
    pub already_closed: bool,
}

/// Hands blocked discharges over to the authority and closes the originating task.
pub struct TaskActionService<S, M, T> {
    store: Arc<S>,
    mutations: Arc<M>,
    tracker: Arc<T>,
    policy: Arc<DischargePolicy>,
}

impl<S, M, T> TaskActionService<S, M, T>
where
    S: PathwayStore + 'static,
    M: CaseMutations + 'static,
    T: TrackingSink + 'static,
{
    pub fn new(
        store: Arc<S>,
        mutations: Arc<M>,
        tracker: Arc<T>,
        policy: Arc<DischargePolicy>,
    ) -> Self {
        Self {
            store,
            mutations,
            tracker,
            policy,
        }
    }

    pub fn finalize(
        &self,
        tree: &PathwayTree,
        provider: &str,
        originating_task: &EntityHandle,
        outcome: &DischargeOutcome,
        today: NaiveDate,
    ) -> Result<FinalizeSummary, DischargeError> {
        let mut summary = FinalizeSummary::default();

        if outcome.is_blocking() {
            summary.collaboration_task =
                self.create_collaboration_task(tree, provider, outcome, today)?;
        }

        let task = self.store.resolve_task(originating_task)?;
        if task.status == TaskStatus::Closed {
            warn!(task = %task.handle, "originating task already closed, skipping close");
            summary.already_closed = true;
        } else {
            self.mutations.close_task(&task)?;
            summary.task_closed = true;
        }

        self.tracker.track_task(&self.policy.process_name)?;
        info!(
            citizen = %tree.citizen,
            provider,
            outcome = outcome.code(),
            task = %task.handle,
            "work item finalized"
        );

        Ok(summary)
    }

    /// Raise a collaboration task on the newest end note so the authority can take over.
    /// Citizens without an end note get no task.
    fn create_collaboration_task(
        &self,
        tree: &PathwayTree,
        provider: &str,
        outcome: &DischargeOutcome,
        today: NaiveDate,
    ) -> Result<Option<EntityHandle>, DischargeError> {
        let newest_note = tree
            .filter(&self.policy.form_path, true)
            .into_iter()
            .filter(|reference| reference.name == self.policy.end_note_form)
            .min_by_key(|reference| Reverse(reference.date));

        let Some(reference) = newest_note else {
            info!(citizen = %tree.citizen, outcome = outcome.code(), "no end note form, skipping collaboration task");
            return Ok(None);
        };

        let note = self.store.resolve_form(reference)?;
        let draft = TaskDraft {
            target: note.handle,
            task_type: self.policy.collaboration_task.clone(),
            title: outcome.code().to_string(),
            responsible_organization: self.policy.authority_organization.clone(),
            start_date: today,
            due_date: today + Duration::days(self.policy.collaboration_due_days),
            description: self.policy.collaboration_description(provider),
        };
        let handle = self.mutations.create_task(&draft)?;
        info!(citizen = %tree.citizen, task = %handle, title = %draft.title, "collaboration task created");

        Ok(Some(handle))
    }
}
