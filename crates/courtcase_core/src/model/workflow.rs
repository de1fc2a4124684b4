//! Litigation phases and the free-text workflow fields grouped under them.
//!
//! # Responsibility
//! - Fix the tab order of the case detail view.
//! - Map every workflow field to its storage key and owning phase.
//!
//! # Invariants
//! - Every `WorkflowField` belongs to exactly one `CasePhase`.
//! - `CaseWorkflow` never stores empty strings; absent means `""`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Litigation phase, in detail-view tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CasePhase {
    InitialConsultation,
    CaseEvaluation,
    LegalResearch,
    DocumentsAndEvidence,
    PreTrialPreparation,
    Negotiation,
    TrialPreparation,
    DuringTrial,
    PostTrial,
}

const ALL_PHASES: [CasePhase; 9] = [
    CasePhase::InitialConsultation,
    CasePhase::CaseEvaluation,
    CasePhase::LegalResearch,
    CasePhase::DocumentsAndEvidence,
    CasePhase::PreTrialPreparation,
    CasePhase::Negotiation,
    CasePhase::TrialPreparation,
    CasePhase::DuringTrial,
    CasePhase::PostTrial,
];

impl CasePhase {
    /// All phases in tab order.
    pub fn all() -> &'static [CasePhase] {
        &ALL_PHASES
    }

    /// Tab label shown in the case detail view.
    pub fn label(self) -> &'static str {
        match self {
            Self::InitialConsultation => "Initial Consultation",
            Self::CaseEvaluation => "Case Evaluation",
            Self::LegalResearch => "Legal Research",
            Self::DocumentsAndEvidence => "Documents & Evidence",
            Self::PreTrialPreparation => "Pre-Trial Preparation",
            Self::Negotiation => "Negotiation",
            Self::TrialPreparation => "Trial Preparation",
            Self::DuringTrial => "During Trial",
            Self::PostTrial => "Post-Trial",
        }
    }

    /// Workflow fields edited on this phase's tab.
    pub fn fields(self) -> &'static [WorkflowField] {
        use WorkflowField as F;
        match self {
            Self::InitialConsultation => &[
                F::ChargesExplanation,
                F::PotentialOutcomes,
                F::TimelineEstimate,
                F::DefenseStrategySteps,
            ],
            Self::CaseEvaluation => &[
                F::EvidenceReview,
                F::CaseStrengths,
                F::CaseWeaknesses,
                F::ExpertConsultation,
            ],
            Self::LegalResearch => &[F::RelevantLaws, F::CasePrecedents, F::LegalStrategy],
            Self::DocumentsAndEvidence => &[],
            Self::PreTrialPreparation => &[
                F::MotionFilings,
                F::DiscoveryProcess,
                F::WitnessPreparation,
            ],
            Self::Negotiation => &[
                F::NegotiationStrategy,
                F::ProsecutionCommunication,
                F::ClientConsultation,
            ],
            Self::TrialPreparation => &[
                F::DefenseStrategy,
                F::MockTrialNotes,
                F::ExhibitPreparation,
            ],
            Self::DuringTrial => &[
                F::OpeningStatement,
                F::CrossExamination,
                F::DefensePresentation,
                F::ClosingArgument,
            ],
            Self::PostTrial => &[
                F::VerdictAndSentencing,
                F::AppealsPlanning,
                F::PostTrialMotions,
            ],
        }
    }

    /// Phases without text fields render as "under development" tabs.
    pub fn is_placeholder(self) -> bool {
        self.fields().is_empty()
    }
}

/// Named free-text field on a case, serialized as its camelCase storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowField {
    ChargesExplanation,
    PotentialOutcomes,
    TimelineEstimate,
    DefenseStrategySteps,
    EvidenceReview,
    CaseStrengths,
    CaseWeaknesses,
    ExpertConsultation,
    RelevantLaws,
    CasePrecedents,
    LegalStrategy,
    MotionFilings,
    DiscoveryProcess,
    WitnessPreparation,
    NegotiationStrategy,
    ProsecutionCommunication,
    ClientConsultation,
    DefenseStrategy,
    MockTrialNotes,
    ExhibitPreparation,
    OpeningStatement,
    CrossExamination,
    DefensePresentation,
    ClosingArgument,
    VerdictAndSentencing,
    AppealsPlanning,
    PostTrialMotions,
}

const ALL_FIELDS: [WorkflowField; 27] = [
    WorkflowField::ChargesExplanation,
    WorkflowField::PotentialOutcomes,
    WorkflowField::TimelineEstimate,
    WorkflowField::DefenseStrategySteps,
    WorkflowField::EvidenceReview,
    WorkflowField::CaseStrengths,
    WorkflowField::CaseWeaknesses,
    WorkflowField::ExpertConsultation,
    WorkflowField::RelevantLaws,
    WorkflowField::CasePrecedents,
    WorkflowField::LegalStrategy,
    WorkflowField::MotionFilings,
    WorkflowField::DiscoveryProcess,
    WorkflowField::WitnessPreparation,
    WorkflowField::NegotiationStrategy,
    WorkflowField::ProsecutionCommunication,
    WorkflowField::ClientConsultation,
    WorkflowField::DefenseStrategy,
    WorkflowField::MockTrialNotes,
    WorkflowField::ExhibitPreparation,
    WorkflowField::OpeningStatement,
    WorkflowField::CrossExamination,
    WorkflowField::DefensePresentation,
    WorkflowField::ClosingArgument,
    WorkflowField::VerdictAndSentencing,
    WorkflowField::AppealsPlanning,
    WorkflowField::PostTrialMotions,
];

impl WorkflowField {
    pub fn all() -> &'static [WorkflowField] {
        &ALL_FIELDS
    }

    /// Storage key used in case documents and patches.
    pub fn as_key(self) -> &'static str {
        match self {
            Self::ChargesExplanation => "chargesExplanation",
            Self::PotentialOutcomes => "potentialOutcomes",
            Self::TimelineEstimate => "timelineEstimate",
            Self::DefenseStrategySteps => "defenseStrategySteps",
            Self::EvidenceReview => "evidenceReview",
            Self::CaseStrengths => "caseStrengths",
            Self::CaseWeaknesses => "caseWeaknesses",
            Self::ExpertConsultation => "expertConsultation",
            Self::RelevantLaws => "relevantLaws",
            Self::CasePrecedents => "casePrecedents",
            Self::LegalStrategy => "legalStrategy",
            Self::MotionFilings => "motionFilings",
            Self::DiscoveryProcess => "discoveryProcess",
            Self::WitnessPreparation => "witnessPreparation",
            Self::NegotiationStrategy => "negotiationStrategy",
            Self::ProsecutionCommunication => "prosecutionCommunication",
            Self::ClientConsultation => "clientConsultation",
            Self::DefenseStrategy => "defenseStrategy",
            Self::MockTrialNotes => "mockTrialNotes",
            Self::ExhibitPreparation => "exhibitPreparation",
            Self::OpeningStatement => "openingStatement",
            Self::CrossExamination => "crossExamination",
            Self::DefensePresentation => "defensePresentation",
            Self::ClosingArgument => "closingArgument",
            Self::VerdictAndSentencing => "verdictAndSentencing",
            Self::AppealsPlanning => "appealsPlanning",
            Self::PostTrialMotions => "postTrialMotions",
        }
    }

    /// Parses an exact storage key.
    pub fn parse(key: &str) -> Option<Self> {
        ALL_FIELDS.iter().copied().find(|field| field.as_key() == key)
    }

    /// Phase tab that owns this field.
    pub fn phase(self) -> CasePhase {
        ALL_PHASES
            .iter()
            .copied()
            .find(|phase| phase.fields().contains(&self))
            .unwrap_or(CasePhase::InitialConsultation)
    }
}

/// Free-text workflow notes of one case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseWorkflow {
    entries: BTreeMap<WorkflowField, String>,
}

impl CaseWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the field text, `""` when never written.
    pub fn get(&self, field: WorkflowField) -> &str {
        self.entries.get(&field).map_or("", String::as_str)
    }

    /// Sets the field text. Empty text clears the entry.
    pub fn set(&mut self, field: WorkflowField, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.entries.remove(&field);
        } else {
            self.entries.insert(field, text);
        }
    }

    /// Builder-style variant of [`CaseWorkflow::set`].
    pub fn with(mut self, field: WorkflowField, text: impl Into<String>) -> Self {
        self.set(field, text);
        self
    }

    /// Number of non-empty fields.
    pub fn filled_count(&self) -> usize {
        self.entries.len()
    }

    /// Non-empty fields of one phase, in declaration order.
    pub fn phase_entries(&self, phase: CasePhase) -> Vec<(WorkflowField, &str)> {
        phase
            .fields()
            .iter()
            .filter_map(|field| {
                self.entries
                    .get(field)
                    .map(|text| (*field, text.as_str()))
            })
            .collect()
    }
}
