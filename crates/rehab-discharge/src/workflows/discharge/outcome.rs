use serde::{Serialize, Serializer};

use super::domain::EntityHandle;

/// Result of the discharge rules. Any variant other than [`DischargeOutcome::None`]
/// blocks the remaining mutating stages and is handed to the authority as a task title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DischargeOutcome {
    None,
    /// The citizen is trained under another municipality's agreement.
    OutOfTown,
    /// Discharge must be completed manually.
    Ended(EndedReason),
    /// An intervention is handed over to another municipality (GGOP).
    Ggop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndedReason {
    TransitionFailed {
        intervention: EntityHandle,
        message: String,
    },
    RehabilitationTeam {
        provider: String,
    },
    CoursePlacement,
}

impl DischargeOutcome {
    pub const fn code(&self) -> &'static str {
        match self {
            DischargeOutcome::None => "",
            DischargeOutcome::OutOfTown => "Udenbys - Robot",
            DischargeOutcome::Ended(_) => "Slut - Robot",
            DischargeOutcome::Ggop => "GGOP - Robot",
        }
    }

    pub const fn is_blocking(&self) -> bool {
        !matches!(self, DischargeOutcome::None)
    }

    pub fn detail(&self) -> String {
        match self {
            DischargeOutcome::None => "discharged".to_string(),
            DischargeOutcome::OutOfTown => "citizen belongs to another municipality".to_string(),
            DischargeOutcome::Ended(EndedReason::TransitionFailed {
                intervention,
                message,
            }) => format!("intervention {intervention} could not be closed: {message}"),
            DischargeOutcome::Ended(EndedReason::RehabilitationTeam { provider }) => {
                format!("active intervention delivered by {provider}")
            }
            DischargeOutcome::Ended(EndedReason::CoursePlacement) => {
                "active course placement intervention".to_string()
            }
            DischargeOutcome::Ggop => "intervention handed over to another municipality".to_string(),
        }
    }
}

impl Serialize for DischargeOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// States visited while processing one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DischargeStage {
    Start,
    InterventionsChecked,
    ShortCircuit,
    FormsClosedAndAffiliationRemoved,
    AuthorityChecked,
    TaskFinalize,
}

impl DischargeStage {
    pub const fn label(self) -> &'static str {
        match self {
            DischargeStage::Start => "start",
            DischargeStage::InterventionsChecked => "interventions_checked",
            DischargeStage::ShortCircuit => "short_circuit",
            DischargeStage::FormsClosedAndAffiliationRemoved => {
                "forms_closed_and_affiliation_removed"
            }
            DischargeStage::AuthorityChecked => "authority_checked",
            DischargeStage::TaskFinalize => "task_finalize",
        }
    }
}
