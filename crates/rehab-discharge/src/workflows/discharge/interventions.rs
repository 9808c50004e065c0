use std::sync::Arc;

use tracing::debug;

use super::domain::{Intervention, Reference};
use super::gateway::PathwayStore;

/// Reference paired with the intervention it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIntervention {
    pub reference: Reference,
    pub intervention: Intervention,
}

/// Resolves intervention references and filters them by state and supplier.
pub struct InterventionResolver<S> {
    store: Arc<S>,
}

impl<S> InterventionResolver<S>
where
    S: PathwayStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// References that no longer resolve are skipped rather than failing the batch.
    pub fn resolve(
        &self,
        references: &[&Reference],
        active_only: bool,
        provider: Option<&str>,
    ) -> Vec<ResolvedIntervention> {
        references
            .iter()
            .filter_map(|reference| match self.store.resolve_intervention(reference) {
                Ok(intervention) => Some(ResolvedIntervention {
                    reference: (*reference).clone(),
                    intervention,
                }),
                Err(err) => {
                    debug!(handle = %reference.handle, error = %err, "skipping unresolvable intervention");
                    None
                }
            })
            .filter(|resolved| !active_only || resolved.intervention.workflow_state.is_active())
            .filter(|resolved| match provider {
                Some(name) => resolved.intervention.supplied_by(name),
                None => true,
            })
            .collect()
    }

    pub fn any(&self, references: &[&Reference], provider: Option<&str>) -> bool {
        !self.resolve(references, true, provider).is_empty()
    }
}
