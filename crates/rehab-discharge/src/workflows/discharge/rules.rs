use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{Citizen, EntityHandle, FormStatus, PathwayTree, TaskDraft, Transition};
use super::errors::DischargeError;
use super::gateway::{CaseMutations, GatewayError, PathwayStore};
use super::interventions::InterventionResolver;
use super::outcome::{DischargeOutcome, EndedReason};
use super::policy::{DischargePolicy, LOAN_FOLLOW_UP_BODY};

/// Best-effort sub-operations whose failures are recorded instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubOperation {
    UnlinkActivity,
    CreateLoanFollowUp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubOperationFailure {
    pub operation: SubOperation,
    pub handle: EntityHandle,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub intervention: EntityHandle,
    pub transition: Transition,
}

/// Everything the rule stages changed in the case system during one work item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageLog {
    pub transitions: Vec<TransitionRecord>,
    pub deactivated_forms: Vec<EntityHandle>,
    pub removed_relations: Vec<EntityHandle>,
    pub follow_up_tasks: Vec<EntityHandle>,
    pub failures: Vec<SubOperationFailure>,
}

impl StageLog {
    fn record_failure(&mut self, operation: SubOperation, handle: &EntityHandle, err: &GatewayError) {
        warn!(?operation, %handle, error = %err, "best-effort operation failed, continuing");
        self.failures.push(SubOperationFailure {
            operation,
            handle: handle.clone(),
            message: err.to_string(),
        });
    }

    pub fn mutation_count(&self) -> usize {
        self.transitions.len()
            + self.deactivated_forms.len()
            + self.removed_relations.len()
            + self.follow_up_tasks.len()
    }
}

/// The four ordered discharge rules.
pub struct DischargeRuleEngine<S, M> {
    store: Arc<S>,
    mutations: Arc<M>,
    resolver: InterventionResolver<S>,
    policy: Arc<DischargePolicy>,
}

impl<S, M> DischargeRuleEngine<S, M>
where
    S: PathwayStore + 'static,
    M: CaseMutations + 'static,
{
    pub fn new(store: Arc<S>, mutations: Arc<M>, policy: Arc<DischargePolicy>) -> Self {
        let resolver = InterventionResolver::new(store.clone());
        Self {
            store,
            mutations,
            resolver,
            policy,
        }
    }

    pub fn load_pathway(&self, citizen: &Citizen) -> Result<PathwayTree, DischargeError> {
        self.store
            .pathway(citizen)?
            .ok_or_else(|| DischargeError::PathwayNotFound(citizen.id.clone()))
    }

    /// Close or remove the provider's interventions unless the citizen belongs to
    /// another municipality. Stops at the first failing transition.
    pub fn close_interventions(
        &self,
        tree: &PathwayTree,
        provider: &str,
        log: &mut StageLog,
    ) -> DischargeOutcome {
        if !tree.filter(&self.policy.out_of_town_path, true).is_empty() {
            info!(citizen = %tree.citizen, "out-of-town intervention present");
            return DischargeOutcome::OutOfTown;
        }

        let grants = tree.filter(&self.policy.basket_grant_path, true);
        for resolved in self.resolver.resolve(&grants, true, Some(provider)) {
            let intervention = &resolved.intervention;
            let transition = Transition::for_state(intervention.workflow_state);

            if let Err(err) = self
                .mutations
                .transition_intervention(intervention, transition)
            {
                warn!(
                    citizen = %tree.citizen,
                    handle = %intervention.handle,
                    transition = transition.label(),
                    error = %err,
                    "intervention transition failed"
                );
                return DischargeOutcome::Ended(EndedReason::TransitionFailed {
                    intervention: intervention.handle.clone(),
                    message: err.to_string(),
                });
            }

            debug!(
                handle = %intervention.handle,
                from = intervention.workflow_state.label(),
                transition = transition.label(),
                "intervention transitioned"
            );
            log.transitions.push(TransitionRecord {
                intervention: intervention.handle.clone(),
                transition,
            });
        }

        DischargeOutcome::None
    }

    /// Deactivate the active forms first authored by `provider`, unlinking their activities.
    pub fn close_forms(
        &self,
        tree: &PathwayTree,
        provider: &str,
        log: &mut StageLog,
    ) -> Result<(), DischargeError> {
        let active = FormStatus::Active.label();
        let candidates = tree
            .filter(&self.policy.form_path, true)
            .into_iter()
            .filter(|reference| reference.status.as_deref() == Some(active))
            .filter(|reference| reference.name != self.policy.excluded_form);

        for reference in candidates {
            let form = self.store.resolve_form(reference)?;
            let mut history = self.store.form_history(&form)?;
            history.sort_by_key(|entry| entry.date);

            let author = history
                .first()
                .and_then(|entry| entry.organization.as_deref());
            if author != Some(provider) {
                debug!(handle = %form.handle, ?author, "form authored by another organization");
                continue;
            }

            for link in self.store.related_activities(&form)? {
                if let Err(err) = self.mutations.delete_activity_link(&link) {
                    log.record_failure(SubOperation::UnlinkActivity, &link.handle, &err);
                }
            }

            self.mutations.set_form_status(&form, FormStatus::Inactive)?;
            info!(handle = %form.handle, form = %form.name, "form deactivated");
            log.deactivated_forms.push(form.handle);
        }

        Ok(())
    }

    pub fn remove_organizational_affiliation(
        &self,
        citizen: &Citizen,
        provider: &str,
        log: &mut StageLog,
    ) -> Result<(), DischargeError> {
        let relations = self.store.organization_relations(citizen)?;
        for relation in relations
            .iter()
            .filter(|relation| relation.organization == provider)
        {
            self.mutations.remove_organization_relation(relation)?;
            info!(citizen = %citizen.id, organization = %relation.organization, "organization relation removed");
            log.removed_relations.push(relation.handle.clone());
        }

        Ok(())
    }

    /// Look for authority-level interventions that must be handled by a caseworker,
    /// then raise follow-up tasks for training equipment still on loan.
    pub fn check_authority_blockers(
        &self,
        citizen: &Citizen,
        tree: &PathwayTree,
        today: NaiveDate,
        log: &mut StageLog,
    ) -> Result<DischargeOutcome, DischargeError> {
        let grants = tree.filter(&self.policy.basket_grant_path, false);
        let active_grants = self.resolver.resolve(&grants, true, None);

        if active_grants
            .iter()
            .any(|resolved| resolved.intervention.supplied_by(&self.policy.ggop_provider))
        {
            return Ok(DischargeOutcome::Ggop);
        }

        let team = self.policy.rehabilitation_teams.iter().find(|team| {
            active_grants
                .iter()
                .any(|resolved| resolved.intervention.supplied_by(team))
        });
        if let Some(team) = team {
            return Ok(DischargeOutcome::Ended(EndedReason::RehabilitationTeam {
                provider: team.clone(),
            }));
        }

        let placements = tree.filter(&self.policy.course_placement_path, true);
        if self.resolver.any(&placements, None) {
            return Ok(DischargeOutcome::Ended(EndedReason::CoursePlacement));
        }

        for loan in self.store.loans(citizen)? {
            if !self.policy.is_training_equipment_grant(loan.grant.as_deref()) {
                continue;
            }

            let draft = TaskDraft {
                target: loan.handle.clone(),
                task_type: self.policy.loan_follow_up_task.clone(),
                title: self.policy.loan_follow_up_task.clone(),
                responsible_organization: self.policy.loan_follow_up_organization.clone(),
                start_date: today,
                due_date: today,
                description: LOAN_FOLLOW_UP_BODY.to_string(),
            };
            match self.mutations.create_task(&draft) {
                Ok(task) => {
                    info!(citizen = %citizen.id, loan = %loan.handle, %task, "loan follow-up task created");
                    log.follow_up_tasks.push(task);
                }
                Err(err) => log.record_failure(SubOperation::CreateLoanFollowUp, &loan.handle, &err),
            }
        }

        Ok(DischargeOutcome::None)
    }
}
