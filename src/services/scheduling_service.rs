use std::ops::Deref;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::repositories::schedule_repository::{ScheduleItemRow, ScheduleRepository};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::conflict::{Conflict, ResolutionSolution};
use crate::models::schedule_item::{
    ItemStatus, Priority, ScheduleItem, ScheduleItemInput, SchedulingMode,
};
use crate::services::conflict_detector;
use crate::services::resolution;
use crate::services::schedule_utils;
use crate::services::slot_allocator;

/// Outcome of reviewing a pending custom request against the committed
/// timeline: the detected conflicts plus ranked remedies for an operator to
/// choose from. An empty conflict list means the request can be committed
/// as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRequestReview {
    pub item: ScheduleItem,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub solutions: Vec<ResolutionSolution>,
}

/// Application-shell orchestration over the scheduling engine.
///
/// The engine itself is pure; this service is the single writer that reads
/// the full timeline, runs validation, detection and allocation, and writes
/// the replacement list back in one transaction.
#[derive(Clone)]
pub struct SchedulingService {
    db: DbPool,
}

impl SchedulingService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Validate and persist a new submission with status `pending`. The
    /// moderation collaborator approves or rejects it later.
    pub fn submit_item(&self, input: ScheduleItemInput) -> AppResult<ScheduleItem> {
        let item = ScheduleItem {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            artist_name: input.artist_name,
            artist_id: input.artist_id,
            category: input.category,
            duration_days: input.duration_days,
            custom_date: input.custom_date,
            custom_time: input.custom_time,
            scheduled_start_at: None,
            scheduled_end_at: None,
            scheduling_mode: input.scheduling_mode.unwrap_or(SchedulingMode::Basic),
            status: ItemStatus::Pending,
            priority: input.priority.unwrap_or(Priority::Medium),
            queue_position: None,
            submitted_at: schedule_utils::format_datetime(schedule_utils::now_fixed()),
        };

        let report = resolution::validate_scheduling_request(&item);
        if !report.valid {
            return Err(AppError::validation(report.errors.join("；")));
        }

        let conn = self.db.get_connection()?;
        ScheduleRepository::insert(&conn, &ScheduleItemRow::from_record(&item))?;
        info!(
            target: "app::scheduling",
            item_id = %item.id,
            mode = item.scheduling_mode.as_str(),
            "schedule item submitted"
        );
        Ok(item)
    }

    /// Write-through for the external moderation collaborator. Approving a
    /// custom item resolves its requested window from date and time.
    pub fn set_status(&self, item_id: &str, status: ItemStatus) -> AppResult<ScheduleItem> {
        let conn = self.db.get_connection()?;
        let row = ScheduleRepository::find_by_id(&conn, item_id)?.ok_or_else(AppError::not_found)?;
        let mut item = row.into_record()?;
        item.status = status;

        if status == ItemStatus::Approved
            && item.scheduling_mode == SchedulingMode::Custom
            && !item.has_resolved_window()
        {
            if let (Some(date), Some(time)) = (item.custom_date.clone(), item.custom_time.clone()) {
                let start = schedule_utils::combine_date_time(&date, &time)?;
                let end = schedule_utils::add_days(start, item.duration_days.max(1))?;
                item.scheduled_start_at = Some(schedule_utils::format_datetime(start));
                item.scheduled_end_at = Some(schedule_utils::format_datetime(end));
            }
        }

        ScheduleRepository::update(&conn, &ScheduleItemRow::from_record(&item))?;
        debug!(target: "app::scheduling", item_id, status = status.as_str(), "item status updated");
        Ok(item)
    }

    /// Check an approved custom request against every other approved window
    /// and, when it collides, propose ranked remedies. Pure read; nothing is
    /// committed here.
    pub fn review_custom_request(&self, item_id: &str) -> AppResult<CustomRequestReview> {
        let conn = self.db.get_connection()?;
        let row = ScheduleRepository::find_by_id(&conn, item_id)?.ok_or_else(AppError::not_found)?;
        let item = row.into_record()?;

        if item.scheduling_mode != SchedulingMode::Custom {
            return Err(AppError::validation("只有定制档期需要冲突审查"));
        }

        let others = ScheduleRepository::list_by_status(&conn, ItemStatus::Approved.as_str())?
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?
            .into_iter()
            .filter(|other| other.id != item.id)
            .collect::<Vec<_>>();

        let conflicts = conflict_detector::detect_conflicts(&item, &others)?;
        let solutions = resolution::propose_resolutions(&item, &conflicts, &others)?;

        info!(
            target: "app::scheduling",
            item_id,
            conflicts = conflicts.len(),
            solutions = solutions.len(),
            "custom request reviewed"
        );

        Ok(CustomRequestReview {
            item,
            conflicts,
            solutions,
        })
    }

    /// Apply the operator-selected solution, rebuild the timeline and commit
    /// the replacement list in one transaction.
    pub fn select_resolution(&self, solution: &ResolutionSolution) -> AppResult<Vec<ScheduleItem>> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction()?;
        let tx_conn = tx.deref();

        let items = ScheduleRepository::list_all(tx_conn)?
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;

        let adjusted = resolution::apply_resolution(items, solution)?;
        let committed = slot_allocator::reorganize_queue_with_priority(adjusted)?;

        let rows = committed
            .iter()
            .map(ScheduleItemRow::from_record)
            .collect::<Vec<_>>();
        ScheduleRepository::replace_all(tx_conn, &rows)?;
        tx.commit()?;

        info!(
            target: "app::scheduling",
            solution_id = %solution.id,
            kind = ?solution.kind,
            "resolution applied and timeline committed"
        );
        Ok(committed)
    }

    /// Read-all, reorganize, write-all. The committed timeline is the single
    /// source of truth for the rest of the application.
    pub fn commit_timeline(&self) -> AppResult<Vec<ScheduleItem>> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction()?;
        let tx_conn = tx.deref();

        let items = ScheduleRepository::list_all(tx_conn)?
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;

        let committed = slot_allocator::reorganize_queue_with_priority(items)?;

        let rows = committed
            .iter()
            .map(ScheduleItemRow::from_record)
            .collect::<Vec<_>>();
        ScheduleRepository::replace_all(tx_conn, &rows)?;
        tx.commit()?;

        debug!(
            target: "app::scheduling",
            items = committed.len(),
            "timeline committed"
        );
        Ok(committed)
    }

    /// Force a basic item ahead of its peers, then rebuild and commit.
    pub fn emergency_reorganization(&self, urgent_item_id: &str) -> AppResult<Vec<ScheduleItem>> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction()?;
        let tx_conn = tx.deref();

        let items = ScheduleRepository::list_all(tx_conn)?
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;

        let committed = slot_allocator::emergency_reorganization(items, urgent_item_id)?;

        let rows = committed
            .iter()
            .map(ScheduleItemRow::from_record)
            .collect::<Vec<_>>();
        ScheduleRepository::replace_all(tx_conn, &rows)?;
        tx.commit()?;

        info!(
            target: "app::scheduling",
            urgent_item_id,
            "emergency reorganization committed"
        );
        Ok(committed)
    }

    pub fn list_timeline(&self) -> AppResult<Vec<ScheduleItem>> {
        let conn = self.db.get_connection()?;
        ScheduleRepository::list_all(&conn)?
            .into_iter()
            .map(|row| row.into_record())
            .collect()
    }
}
