use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::schedule_item::{ItemStatus, Priority, ScheduleItem, SchedulingMode};

#[derive(Debug, Clone)]
pub struct ScheduleItemRow {
    pub id: String,
    pub title: String,
    pub artist_name: String,
    pub artist_id: String,
    pub category: Option<String>,
    pub duration_days: i64,
    pub custom_date: Option<String>,
    pub custom_time: Option<String>,
    pub scheduled_start_at: Option<String>,
    pub scheduled_end_at: Option<String>,
    pub scheduling_mode: String,
    pub status: String,
    pub priority: String,
    pub queue_position: Option<i64>,
    pub submitted_at: String,
}

impl ScheduleItemRow {
    pub fn from_record(record: &ScheduleItem) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            artist_name: record.artist_name.clone(),
            artist_id: record.artist_id.clone(),
            category: record.category.clone(),
            duration_days: record.duration_days,
            custom_date: record.custom_date.clone(),
            custom_time: record.custom_time.clone(),
            scheduled_start_at: record.scheduled_start_at.clone(),
            scheduled_end_at: record.scheduled_end_at.clone(),
            scheduling_mode: record.scheduling_mode.as_str().to_string(),
            status: record.status.as_str().to_string(),
            priority: record.priority.as_str().to_string(),
            queue_position: record.queue_position,
            submitted_at: record.submitted_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<ScheduleItem> {
        let scheduling_mode = SchedulingMode::parse(&self.scheduling_mode).ok_or_else(|| {
            AppError::database(format!("未知的排期模式: {}", self.scheduling_mode))
        })?;
        let status = ItemStatus::parse(&self.status)
            .ok_or_else(|| AppError::database(format!("未知的作品状态: {}", self.status)))?;
        let priority = Priority::parse(&self.priority)
            .ok_or_else(|| AppError::database(format!("未知的优先级: {}", self.priority)))?;

        Ok(ScheduleItem {
            id: self.id,
            title: self.title,
            artist_name: self.artist_name,
            artist_id: self.artist_id,
            category: self.category,
            duration_days: self.duration_days,
            custom_date: self.custom_date,
            custom_time: self.custom_time,
            scheduled_start_at: self.scheduled_start_at,
            scheduled_end_at: self.scheduled_end_at,
            scheduling_mode,
            status,
            priority,
            queue_position: self.queue_position,
            submitted_at: self.submitted_at,
        })
    }
}

impl TryFrom<&Row<'_>> for ScheduleItemRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            artist_name: row.get("artist_name")?,
            artist_id: row.get("artist_id")?,
            category: row.get("category")?,
            duration_days: row.get("duration_days")?,
            custom_date: row.get("custom_date")?,
            custom_time: row.get("custom_time")?,
            scheduled_start_at: row.get("scheduled_start_at")?,
            scheduled_end_at: row.get("scheduled_end_at")?,
            scheduling_mode: row.get("scheduling_mode")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            queue_position: row.get("queue_position")?,
            submitted_at: row.get("submitted_at")?,
        })
    }
}

pub struct ScheduleRepository;

impl ScheduleRepository {
    pub fn insert(conn: &Connection, row: &ScheduleItemRow) -> AppResult<()> {
        conn.execute(
            r#"
            INSERT INTO schedule_items (
                id, title, artist_name, artist_id, category, duration_days,
                custom_date, custom_time, scheduled_start_at, scheduled_end_at,
                scheduling_mode, status, priority, queue_position, submitted_at
            ) VALUES (
                :id, :title, :artist_name, :artist_id, :category, :duration_days,
                :custom_date, :custom_time, :scheduled_start_at, :scheduled_end_at,
                :scheduling_mode, :status, :priority, :queue_position, :submitted_at
            )
            "#,
            named_params! {
                ":id": row.id,
                ":title": row.title,
                ":artist_name": row.artist_name,
                ":artist_id": row.artist_id,
                ":category": row.category,
                ":duration_days": row.duration_days,
                ":custom_date": row.custom_date,
                ":custom_time": row.custom_time,
                ":scheduled_start_at": row.scheduled_start_at,
                ":scheduled_end_at": row.scheduled_end_at,
                ":scheduling_mode": row.scheduling_mode,
                ":status": row.status,
                ":priority": row.priority,
                ":queue_position": row.queue_position,
                ":submitted_at": row.submitted_at,
            },
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, row: &ScheduleItemRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
            UPDATE schedule_items SET
                title = :title,
                artist_name = :artist_name,
                artist_id = :artist_id,
                category = :category,
                duration_days = :duration_days,
                custom_date = :custom_date,
                custom_time = :custom_time,
                scheduled_start_at = :scheduled_start_at,
                scheduled_end_at = :scheduled_end_at,
                scheduling_mode = :scheduling_mode,
                status = :status,
                priority = :priority,
                queue_position = :queue_position,
                submitted_at = :submitted_at
            WHERE id = :id
            "#,
            named_params! {
                ":id": row.id,
                ":title": row.title,
                ":artist_name": row.artist_name,
                ":artist_id": row.artist_id,
                ":category": row.category,
                ":duration_days": row.duration_days,
                ":custom_date": row.custom_date,
                ":custom_time": row.custom_time,
                ":scheduled_start_at": row.scheduled_start_at,
                ":scheduled_end_at": row.scheduled_end_at,
                ":scheduling_mode": row.scheduling_mode,
                ":status": row.status,
                ":priority": row.priority,
                ":queue_position": row.queue_position,
                ":submitted_at": row.submitted_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<ScheduleItemRow>> {
        let row = conn
            .query_row(
                "SELECT * FROM schedule_items WHERE id = ?1",
                [id],
                |row| ScheduleItemRow::try_from(row),
            )
            .optional()?;
        Ok(row)
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<ScheduleItemRow>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM schedule_items
             ORDER BY queue_position IS NULL, queue_position ASC, submitted_at ASC",
        )?;
        let rows = stmt
            .query_map([], |row| ScheduleItemRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_by_status(conn: &Connection, status: &str) -> AppResult<Vec<ScheduleItemRow>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM schedule_items WHERE status = ?1
             ORDER BY queue_position IS NULL, queue_position ASC, submitted_at ASC",
        )?;
        let rows = stmt
            .query_map([status], |row| ScheduleItemRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Replace the committed timeline wholesale. Runs inside the caller's
    /// transaction so readers never observe a half-written queue.
    pub fn replace_all(conn: &Connection, rows: &[ScheduleItemRow]) -> AppResult<()> {
        conn.execute("DELETE FROM schedule_items", [])?;
        for row in rows {
            Self::insert(conn, row)?;
        }
        Ok(())
    }
}
