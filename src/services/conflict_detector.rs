use chrono::{DateTime, FixedOffset};

use crate::error::AppResult;
use crate::models::conflict::{Conflict, ConflictKind};
use crate::models::schedule_item::ScheduleItem;
use crate::services::schedule_utils::{self, MIN_GAP_MS};
use crate::services::slot_finder;

/// Check a requested window against the committed timeline.
///
/// A requested item without both endpoints resolved cannot conflict with
/// anything yet, so the result is empty — an edge case, not an error. One
/// existing item may contribute two conflicts (overlap and too-close) when
/// both violations hold; each carries its own freshly computed suggestion
/// list.
pub fn detect_conflicts(
    requested: &ScheduleItem,
    existing: &[ScheduleItem],
) -> AppResult<Vec<Conflict>> {
    detect_conflicts_at(requested, existing, schedule_utils::now_fixed())
}

pub fn detect_conflicts_at(
    requested: &ScheduleItem,
    existing: &[ScheduleItem],
    now: DateTime<FixedOffset>,
) -> AppResult<Vec<Conflict>> {
    let req_start =
        schedule_utils::parse_optional_datetime(requested.scheduled_start_at.as_ref())?;
    let req_end = schedule_utils::parse_optional_datetime(requested.scheduled_end_at.as_ref())?;

    let (req_start, req_end) = match (req_start, req_end) {
        (Some(start), Some(end)) => (start, end),
        _ => return Ok(Vec::new()),
    };

    let mut conflicts = Vec::new();
    for other in existing {
        if other.id == requested.id {
            continue;
        }

        let other_start =
            schedule_utils::parse_optional_datetime(other.scheduled_start_at.as_ref())?;
        let other_end = schedule_utils::parse_optional_datetime(other.scheduled_end_at.as_ref())?;
        let (other_start, other_end) = match (other_start, other_end) {
            (Some(start), Some(end)) => (start, end),
            _ => continue,
        };

        if schedule_utils::overlaps(req_start, req_end, other_start, other_end)? {
            conflicts.push(Conflict {
                kind: ConflictKind::Overlap,
                item_id: other.id.clone(),
                item_title: other.title.clone(),
                suggested_times: slot_finder::generate_alternative_times_from(
                    requested, existing, now,
                )?,
            });
        }

        if schedule_utils::boundary_gap_ms(req_start, req_end, other_start, other_end) < MIN_GAP_MS
        {
            conflicts.push(Conflict {
                kind: ConflictKind::TooClose,
                item_id: other.id.clone(),
                item_title: other.title.clone(),
                suggested_times: slot_finder::generate_alternative_times_from(
                    requested, existing, now,
                )?,
            });
        }
    }

    Ok(conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule_item::{ItemStatus, Priority, SchedulingMode};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn day(offset_days: i64) -> DateTime<FixedOffset> {
        let tz = FixedOffset::east_opt(0).expect("offset");
        tz.from_local_datetime(
            &NaiveDate::from_ymd_opt(2025, 7, 1)
                .expect("valid date")
                .and_hms_opt(0, 0, 0)
                .expect("valid time"),
        )
        .single()
        .expect("valid datetime")
            + Duration::days(offset_days)
    }

    fn item(id: &str, window: Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)>) -> ScheduleItem {
        ScheduleItem {
            id: id.to_string(),
            title: format!("Artwork {id}"),
            artist_name: "Noor".to_string(),
            artist_id: "artist-9".to_string(),
            category: Some("generative".to_string()),
            duration_days: 3,
            custom_date: None,
            custom_time: None,
            scheduled_start_at: window.map(|(start, _)| schedule_utils::format_datetime(start)),
            scheduled_end_at: window.map(|(_, end)| schedule_utils::format_datetime(end)),
            scheduling_mode: SchedulingMode::Custom,
            status: ItemStatus::Approved,
            priority: Priority::Medium,
            queue_position: None,
            submitted_at: schedule_utils::format_datetime(day(0)),
        }
    }

    #[test]
    fn overlapping_request_yields_single_overlap_conflict() -> AppResult<()> {
        let existing = item("x", Some((day(0), day(3))));
        let requested = item("y", Some((day(1), day(4))));

        let conflicts = detect_conflicts_at(&requested, &[existing.clone()], day(0))?;
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::Overlap);
        assert_eq!(conflicts[0].item_id, "x");

        assert!(conflicts[0].suggested_times.len() <= 5);
        let ex_start = day(0);
        let ex_end = day(3);
        for raw in &conflicts[0].suggested_times {
            let start = schedule_utils::parse_datetime(raw)?;
            let end = start + Duration::days(3);
            assert!(!schedule_utils::overlaps(start, end, ex_start, ex_end)?);
        }
        Ok(())
    }

    #[test]
    fn adjacent_windows_are_too_close() -> AppResult<()> {
        let existing = item("x", Some((day(0), day(3))));
        // Starts exactly when the existing auction ends: no overlap, zero gap.
        let requested = item("y", Some((day(3), day(5))));

        let conflicts = detect_conflicts_at(&requested, &[existing], day(0))?;
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::TooClose);
        Ok(())
    }

    #[test]
    fn slight_overlap_reports_both_kinds() -> AppResult<()> {
        let existing = item("x", Some((day(0), day(3))));
        // Pushes half an hour into the tail of the existing auction.
        let requested = item(
            "y",
            Some((day(3) - Duration::minutes(30), day(5))),
        );

        let conflicts = detect_conflicts_at(&requested, &[existing], day(0))?;
        assert_eq!(conflicts.len(), 2);
        assert!(conflicts.iter().any(|c| c.kind == ConflictKind::Overlap));
        assert!(conflicts.iter().any(|c| c.kind == ConflictKind::TooClose));
        Ok(())
    }

    #[test]
    fn unresolved_request_cannot_conflict() -> AppResult<()> {
        let existing = item("x", Some((day(0), day(3))));
        let requested = item("y", None);

        let conflicts = detect_conflicts_at(&requested, &[existing], day(0))?;
        assert!(conflicts.is_empty());
        Ok(())
    }

    #[test]
    fn conflict_detection_is_symmetric_for_overlap() -> AppResult<()> {
        let a = item("a", Some((day(0), day(3))));
        let b = item("b", Some((day(1), day(4))));

        let forward = detect_conflicts_at(&b, &[a.clone()], day(0))?;
        let reverse = detect_conflicts_at(&a, &[b], day(0))?;
        assert!(forward.iter().any(|c| c.kind == ConflictKind::Overlap));
        assert!(reverse.iter().any(|c| c.kind == ConflictKind::Overlap));
        Ok(())
    }
}
