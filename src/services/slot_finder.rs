use chrono::{DateTime, FixedOffset, NaiveTime};

use crate::error::AppResult;
use crate::models::schedule_item::ScheduleItem;
use crate::services::schedule_utils::{self, MIN_GAP_MS};

/// Future horizon scanned for free slots, in days.
const HORIZON_DAYS: i64 = 30;

/// Candidate auction start hours within a day, 9AM–9PM every three hours.
const CANDIDATE_HOURS: [u32; 4] = [9, 12, 15, 18];

const MAX_SUGGESTIONS: usize = 5;

/// Brute-force search for open slots of the requested duration over the next
/// 30 days. Returns up to five RFC3339 start instants; fewer (possibly zero)
/// means the horizon is exhausted, which is a normal outcome rather than an
/// error.
///
/// A slot is accepted only when it clears both the overlap check and the
/// one-hour minimum gap, so taking a suggestion never reintroduces a
/// conflict of either kind.
pub fn generate_alternative_times(
    requested: &ScheduleItem,
    existing: &[ScheduleItem],
) -> AppResult<Vec<String>> {
    generate_alternative_times_from(requested, existing, schedule_utils::now_fixed())
}

/// Deterministic variant used by callers that need a reproducible search
/// origin.
pub fn generate_alternative_times_from(
    requested: &ScheduleItem,
    existing: &[ScheduleItem],
    now: DateTime<FixedOffset>,
) -> AppResult<Vec<String>> {
    let occupied = resolved_windows(requested, existing)?;

    let mut suggestions = Vec::new();
    'horizon: for day in 1..=HORIZON_DAYS {
        let candidate_day = schedule_utils::add_days(now, day)?;
        for hour in CANDIDATE_HOURS {
            let time = NaiveTime::from_hms_opt(hour, 0, 0).expect("candidate hour is valid");
            let start = schedule_utils::at_time_of_day(candidate_day, time);
            let end = schedule_utils::add_days(start, requested.duration_days.max(1))?;

            // A usable slot neither overlaps an occupied window nor sits
            // closer than the minimum gap to one.
            let mut free = true;
            for (ex_start, ex_end) in &occupied {
                if schedule_utils::overlaps(start, end, *ex_start, *ex_end)?
                    || schedule_utils::boundary_gap_ms(start, end, *ex_start, *ex_end) < MIN_GAP_MS
                {
                    free = false;
                    break;
                }
            }

            if free {
                suggestions.push(schedule_utils::format_datetime(start));
                if suggestions.len() >= MAX_SUGGESTIONS {
                    break 'horizon;
                }
            }
        }
    }

    Ok(suggestions)
}

fn resolved_windows(
    requested: &ScheduleItem,
    existing: &[ScheduleItem],
) -> AppResult<Vec<(DateTime<FixedOffset>, DateTime<FixedOffset>)>> {
    let mut windows = Vec::new();
    for item in existing {
        if item.id == requested.id {
            continue;
        }
        let start = schedule_utils::parse_optional_datetime(item.scheduled_start_at.as_ref())?;
        let end = schedule_utils::parse_optional_datetime(item.scheduled_end_at.as_ref())?;
        if let (Some(start), Some(end)) = (start, end) {
            windows.push((start, end));
        }
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule_item::{ItemStatus, Priority, SchedulingMode};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn base_now() -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(0).expect("offset");
        offset
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2025, 7, 1)
                    .expect("valid date")
                    .and_hms_opt(8, 0, 0)
                    .expect("valid time"),
            )
            .single()
            .expect("valid datetime")
    }

    fn item(id: &str, start: Option<DateTime<FixedOffset>>, days: i64) -> ScheduleItem {
        ScheduleItem {
            id: id.to_string(),
            title: format!("Artwork {id}"),
            artist_name: "Mika".to_string(),
            artist_id: "artist-1".to_string(),
            category: None,
            duration_days: days,
            custom_date: None,
            custom_time: None,
            scheduled_start_at: start.map(schedule_utils::format_datetime),
            scheduled_end_at: start
                .map(|dt| schedule_utils::format_datetime(dt + Duration::days(days))),
            scheduling_mode: SchedulingMode::Basic,
            status: ItemStatus::Approved,
            priority: Priority::Medium,
            queue_position: None,
            submitted_at: schedule_utils::format_datetime(base_now()),
        }
    }

    #[test]
    fn finds_up_to_five_free_slots() -> AppResult<()> {
        let now = base_now();
        let requested = item("req", None, 2);
        let busy = item("busy", Some(now + Duration::days(1)), 3);

        let suggestions = generate_alternative_times_from(&requested, &[busy.clone()], now)?;
        assert_eq!(suggestions.len(), 5);

        let busy_start = schedule_utils::parse_datetime(busy.scheduled_start_at.as_ref().unwrap())?;
        let busy_end = schedule_utils::parse_datetime(busy.scheduled_end_at.as_ref().unwrap())?;
        for raw in &suggestions {
            let start = schedule_utils::parse_datetime(raw)?;
            let end = start + Duration::days(2);
            assert!(!schedule_utils::overlaps(start, end, busy_start, busy_end)?);
        }
        Ok(())
    }

    #[test]
    fn exhausted_horizon_returns_empty() -> AppResult<()> {
        let now = base_now();
        let requested = item("req", None, 1);
        // One long-running auction blankets the entire 30-day horizon.
        let wall = item("wall", Some(now - Duration::days(1)), 40);

        let suggestions = generate_alternative_times_from(&requested, &[wall], now)?;
        assert!(suggestions.is_empty());
        Ok(())
    }

    #[test]
    fn ignores_windows_of_the_requested_item_itself() -> AppResult<()> {
        // The item being moved must not block its own alternatives.
        let now = base_now();
        let requested = item("req", Some(now + Duration::days(2)), 40);

        let suggestions =
            generate_alternative_times_from(&requested, &[requested.clone()], now)?;
        assert_eq!(suggestions.len(), 5);
        Ok(())
    }
}
