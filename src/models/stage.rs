use serde::{Deserialize, Serialize};

/// Label used for any stage code outside 1..=9
pub const UNKNOWN_STAGE_LABEL: &str = "Unknown Stage";

/// Default terminal stage for duration classification (Commission Collection)
pub const DEFAULT_TERMINAL_STAGE: i64 = 8;

/// Pipeline stage
///
/// Codes 1 and 9 are terminal negative outcomes, 8 is the terminal
/// "Commission Collection" stage. Codes outside 1..=9 are kept as `Unknown`
/// so that a bad row never aborts a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    NotInterested,
    InitialContact,
    RequirementCollection,
    PropertyTouring,
    PropertyTourAndFeedback,
    ApplicationAndApproval,
    PostApprovalAndFollowUp,
    CommissionCollection,
    DeadStage,
    Unknown(i64),
}

impl Stage {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Stage::NotInterested,
            2 => Stage::InitialContact,
            3 => Stage::RequirementCollection,
            4 => Stage::PropertyTouring,
            5 => Stage::PropertyTourAndFeedback,
            6 => Stage::ApplicationAndApproval,
            7 => Stage::PostApprovalAndFollowUp,
            8 => Stage::CommissionCollection,
            9 => Stage::DeadStage,
            other => Stage::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Stage::NotInterested => 1,
            Stage::InitialContact => 2,
            Stage::RequirementCollection => 3,
            Stage::PropertyTouring => 4,
            Stage::PropertyTourAndFeedback => 5,
            Stage::ApplicationAndApproval => 6,
            Stage::PostApprovalAndFollowUp => 7,
            Stage::CommissionCollection => 8,
            Stage::DeadStage => 9,
            Stage::Unknown(code) => *code,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::NotInterested => "Not Interested",
            Stage::InitialContact => "Initial Contact",
            Stage::RequirementCollection => "Requirement Collection",
            Stage::PropertyTouring => "Property Touring",
            Stage::PropertyTourAndFeedback => "Property Tour and Feedback",
            Stage::ApplicationAndApproval => "Application and Approval",
            Stage::PostApprovalAndFollowUp => "Post-Approval and Follow-Up",
            Stage::CommissionCollection => "Commission Collection",
            Stage::DeadStage => "Dead Stage",
            Stage::Unknown(_) => UNKNOWN_STAGE_LABEL,
        }
    }
}

/// Human-readable label for a raw stage code
pub fn stage_label(code: i64) -> &'static str {
    Stage::from_code(code).label()
}
