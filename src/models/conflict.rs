use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Overlap,
    TooClose,
}

/// Detected pairwise violation between a requested window and one existing
/// committed window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub kind: ConflictKind,
    pub item_id: String,
    pub item_title: String,
    #[serde(default)]
    pub suggested_times: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolutionKind {
    Pause,
    Reschedule,
    Reject,
    Overlap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAssignment {
    pub item_id: String,
    pub start_at: String,
}

/// Proposed remedy for one or more conflicts. The score in [0, 10] orders
/// proposals for display; a human always makes the final selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSolution {
    pub id: String,
    pub kind: SolutionKind,
    pub description: String,
    pub affected_item_ids: Vec<String>,
    #[serde(default)]
    pub new_schedule: Vec<ScheduleAssignment>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}
