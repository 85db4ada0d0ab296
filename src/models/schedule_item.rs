use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    Basic,
    Custom,
}

impl SchedulingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulingMode::Basic => "basic",
            SchedulingMode::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "basic" => Some(SchedulingMode::Basic),
            "custom" => Some(SchedulingMode::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Approved,
    Rejected,
    Removed,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Approved => "approved",
            ItemStatus::Rejected => "rejected",
            ItemStatus::Removed => "removed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ItemStatus::Pending),
            "approved" => Some(ItemStatus::Approved),
            "rejected" => Some(ItemStatus::Rejected),
            "removed" => Some(ItemStatus::Removed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Rank used to order basic-queue items among themselves.
    pub fn rank(self) -> i64 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// One unit of work to be placed on the auction timeline.
///
/// Timestamps are RFC3339 strings at the model boundary; the scheduling
/// services parse them into `DateTime<FixedOffset>` when they need to
/// compare windows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    pub title: String,
    pub artist_name: String,
    pub artist_id: String,
    #[serde(default)]
    pub category: Option<String>,
    pub duration_days: i64,
    #[serde(default)]
    pub custom_date: Option<String>,
    #[serde(default)]
    pub custom_time: Option<String>,
    #[serde(default)]
    pub scheduled_start_at: Option<String>,
    #[serde(default)]
    pub scheduled_end_at: Option<String>,
    pub scheduling_mode: SchedulingMode,
    pub status: ItemStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub queue_position: Option<i64>,
    pub submitted_at: String,
}

impl ScheduleItem {
    pub fn is_approved(&self) -> bool {
        self.status == ItemStatus::Approved
    }

    /// A window only exists once both endpoints are resolved.
    pub fn has_resolved_window(&self) -> bool {
        self.scheduled_start_at.is_some() && self.scheduled_end_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItemInput {
    pub title: String,
    pub artist_name: String,
    pub artist_id: String,
    #[serde(default)]
    pub category: Option<String>,
    pub duration_days: i64,
    #[serde(default)]
    pub scheduling_mode: Option<SchedulingMode>,
    #[serde(default)]
    pub custom_date: Option<String>,
    #[serde(default)]
    pub custom_time: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}
