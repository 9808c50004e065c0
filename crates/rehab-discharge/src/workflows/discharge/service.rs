use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::domain::{Citizen, CitizenId, EntityHandle};
use super::errors::DischargeError;
use super::gateway::{CaseMutations, PathwayStore, TrackingSink};
use super::outcome::{DischargeOutcome, DischargeStage};
use super::policy::DischargePolicy;
use super::rules::{DischargeRuleEngine, StageLog};
use super::tasks::{FinalizeSummary, TaskActionService};
use super::work_item::WorkItemPayload;

/// Result of discharging one citizen from one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DischargeReport {
    pub citizen: CitizenId,
    pub provider: String,
    pub task: EntityHandle,
    pub outcome: DischargeOutcome,
    pub outcome_detail: String,
    pub stages: Vec<DischargeStage>,
    pub log: StageLog,
    pub finalize: FinalizeSummary,
}

/// Orchestrates the rule stages and the final task action for a work item.
pub struct DischargeService<S, M, T> {
    store: Arc<S>,
    engine: DischargeRuleEngine<S, M>,
    tasks: TaskActionService<S, M, T>,
}

impl<S, M, T> DischargeService<S, M, T>
where
    S: PathwayStore + 'static,
    M: CaseMutations + 'static,
    T: TrackingSink + 'static,
{
    pub fn new(store: Arc<S>, mutations: Arc<M>, tracker: Arc<T>, policy: DischargePolicy) -> Self {
        let policy = Arc::new(policy);
        let engine = DischargeRuleEngine::new(store.clone(), mutations.clone(), policy.clone());
        let tasks = TaskActionService::new(store.clone(), mutations, tracker, policy);
        Self {
            store,
            engine,
            tasks,
        }
    }

    /// Resolve the citizen named on the payload and discharge them from its provider.
    pub fn process(
        &self,
        payload: &WorkItemPayload,
        today: NaiveDate,
    ) -> Result<DischargeReport, DischargeError> {
        let provider = payload.provider()?;
        let citizen_id = payload.citizen_id()?;
        let citizen = self
            .store
            .find_citizen(&citizen_id)?
            .ok_or(DischargeError::CitizenNotFound(citizen_id))?;

        self.discharge(&citizen, provider, payload.task_handle(), today)
    }

    /// Run the stage machine. A blocking outcome from the intervention stage skips
    /// straight to finalize; otherwise forms, affiliation and authority checks run in order.
    pub fn discharge(
        &self,
        citizen: &Citizen,
        provider: &str,
        originating_task: &EntityHandle,
        today: NaiveDate,
    ) -> Result<DischargeReport, DischargeError> {
        let tree = self.engine.load_pathway(citizen)?;
        let mut log = StageLog::default();
        let mut outcome = DischargeOutcome::None;
        let mut stages = vec![DischargeStage::Start];
        let mut stage = DischargeStage::Start;

        while stage != DischargeStage::TaskFinalize {
            stage = match stage {
                DischargeStage::Start => {
                    outcome = self.engine.close_interventions(&tree, provider, &mut log);
                    DischargeStage::InterventionsChecked
                }
                DischargeStage::InterventionsChecked if outcome.is_blocking() => {
                    DischargeStage::ShortCircuit
                }
                DischargeStage::InterventionsChecked => {
                    self.engine.close_forms(&tree, provider, &mut log)?;
                    self.engine
                        .remove_organizational_affiliation(citizen, provider, &mut log)?;
                    DischargeStage::FormsClosedAndAffiliationRemoved
                }
                DischargeStage::FormsClosedAndAffiliationRemoved => {
                    outcome = self
                        .engine
                        .check_authority_blockers(citizen, &tree, today, &mut log)?;
                    DischargeStage::AuthorityChecked
                }
                DischargeStage::ShortCircuit
                | DischargeStage::AuthorityChecked
                | DischargeStage::TaskFinalize => DischargeStage::TaskFinalize,
            };
            debug!(citizen = %citizen.id, stage = stage.label(), "discharge stage reached");
            stages.push(stage);
        }

        let finalize = self
            .tasks
            .finalize(&tree, provider, originating_task, &outcome, today)?;

        info!(
            citizen = %citizen.id,
            provider,
            outcome = outcome.code(),
            mutations = log.mutation_count(),
            failures = log.failures.len(),
            "discharge completed"
        );

        Ok(DischargeReport {
            citizen: citizen.id.clone(),
            provider: provider.to_string(),
            task: originating_task.clone(),
            outcome_detail: outcome.detail(),
            outcome,
            stages,
            log,
            finalize,
        })
    }
}
