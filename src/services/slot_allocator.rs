use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::schedule_item::{Priority, ScheduleItem, SchedulingMode};
use crate::services::schedule_utils;

/// Merge custom-scheduled and basic-queue items into one ordered,
/// non-overlapping timeline.
///
/// Custom items keep their requested windows untouched; basic items are
/// packed around them in priority order. Non-approved items pass through
/// unchanged, appended after all approved items. The allocator assumes the
/// caller has already resolved custom-custom conflicts through the
/// resolution flow; it does not re-check them.
pub fn reorganize_queue_with_priority(items: Vec<ScheduleItem>) -> AppResult<Vec<ScheduleItem>> {
    reorganize_queue_with_priority_at(items, schedule_utils::now_fixed())
}

/// Deterministic variant: the allocation cursor starts at `now`.
pub fn reorganize_queue_with_priority_at(
    items: Vec<ScheduleItem>,
    now: DateTime<FixedOffset>,
) -> AppResult<Vec<ScheduleItem>> {
    if items.is_empty() {
        return Ok(items);
    }

    let mut custom_items = Vec::new();
    let mut basic_items = Vec::new();
    let mut passthrough = Vec::new();

    for item in items {
        if !item.is_approved() {
            passthrough.push(item);
        } else if item.scheduling_mode == SchedulingMode::Custom {
            custom_items.push(item);
        } else {
            basic_items.push(item);
        }
    }

    // Custom items without a resolved start sort as time zero, i.e. first.
    custom_items.sort_by_key(|item| start_millis_or_zero(item));
    basic_items.sort_by(|a, b| {
        b.priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
    });

    debug!(
        target: "app::scheduling",
        custom = custom_items.len(),
        basic = basic_items.len(),
        passthrough = passthrough.len(),
        "reorganizing auction queue"
    );

    let mut placed = Vec::with_capacity(custom_items.len() + basic_items.len());
    let mut cursor = now;
    let mut position: i64 = 1;
    let mut custom_iter = custom_items.into_iter().peekable();
    let mut basic_iter = basic_items.into_iter().peekable();

    loop {
        let place_custom = match (custom_iter.peek(), basic_iter.peek()) {
            (Some(custom), Some(basic)) => {
                let custom_start = start_millis_or_zero(custom);
                let tentative_end = schedule_utils::add_days(cursor, basic.duration_days)?;
                custom_start <= cursor.timestamp_millis()
                    || tentative_end.timestamp_millis() > custom_start
            }
            (Some(_), Option::None) => true,
            (Option::None, Some(_)) => false,
            (Option::None, Option::None) => break,
        };

        if place_custom {
            let mut item = custom_iter.next().expect("peeked custom item");
            item.queue_position = Some(position);
            position += 1;

            // The requested window is authoritative; only the cursor moves,
            // and never backwards.
            if let Some(end) =
                schedule_utils::parse_optional_datetime(item.scheduled_end_at.as_ref())?
            {
                if end > cursor {
                    cursor = end;
                }
            }
            placed.push(item);
        } else {
            let mut item = basic_iter.next().expect("peeked basic item");
            let end = schedule_utils::add_days(cursor, item.duration_days)?;
            item.scheduled_start_at = Some(schedule_utils::format_datetime(cursor));
            item.scheduled_end_at = Some(schedule_utils::format_datetime(end));
            item.queue_position = Some(position);
            position += 1;
            cursor = end;
            placed.push(item);
        }
    }

    // Defensive: the loop consumes both streams, but any stragglers would be
    // packed sequentially after the last placed window.
    for mut item in basic_iter {
        let end = schedule_utils::add_days(cursor, item.duration_days)?;
        item.scheduled_start_at = Some(schedule_utils::format_datetime(cursor));
        item.scheduled_end_at = Some(schedule_utils::format_datetime(end));
        item.queue_position = Some(position);
        position += 1;
        cursor = end;
        placed.push(item);
    }

    placed.extend(passthrough);
    Ok(placed)
}

/// Force a basic item ahead of its peers without changing its scheduling
/// mode, then rebuild the timeline.
pub fn emergency_reorganization(
    items: Vec<ScheduleItem>,
    urgent_item_id: &str,
) -> AppResult<Vec<ScheduleItem>> {
    emergency_reorganization_at(items, urgent_item_id, schedule_utils::now_fixed())
}

pub fn emergency_reorganization_at(
    mut items: Vec<ScheduleItem>,
    urgent_item_id: &str,
    now: DateTime<FixedOffset>,
) -> AppResult<Vec<ScheduleItem>> {
    match items.iter_mut().find(|item| item.id == urgent_item_id) {
        Some(item) => {
            item.priority = Priority::High;
        }
        Option::None => {
            warn!(
                target: "app::scheduling",
                urgent_item_id,
                "emergency reorganization requested for unknown item"
            );
        }
    }
    reorganize_queue_with_priority_at(items, now)
}

fn start_millis_or_zero(item: &ScheduleItem) -> i64 {
    item.scheduled_start_at
        .as_ref()
        .and_then(|raw| schedule_utils::parse_datetime(raw).ok())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}
