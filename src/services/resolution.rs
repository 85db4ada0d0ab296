use std::cmp::Ordering;

use chrono::{DateTime, Duration, FixedOffset};
use tracing::info;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::conflict::{
    Conflict, ResolutionSolution, ScheduleAssignment, SolutionKind, ValidationReport,
};
use crate::models::schedule_item::{ScheduleItem, SchedulingMode};
use crate::services::schedule_utils;
use crate::services::slot_finder;

/// Furthest ahead a curated slot may be booked, in days.
const MAX_ADVANCE_DAYS: i64 = 90;

const MIN_DURATION_DAYS: i64 = 1;
const MAX_DURATION_DAYS: i64 = 14;

/// Gate applied before any conflict detection. All rules are checked and
/// errors accumulate; the report is data, never an `Err`.
pub fn validate_scheduling_request(item: &ScheduleItem) -> ValidationReport {
    validate_scheduling_request_at(item, schedule_utils::now_fixed())
}

pub fn validate_scheduling_request_at(
    item: &ScheduleItem,
    now: DateTime<FixedOffset>,
) -> ValidationReport {
    let mut errors = Vec::new();

    if item.scheduling_mode == SchedulingMode::Custom {
        match (item.custom_date.as_deref(), item.custom_time.as_deref()) {
            (Some(date), Some(time)) => match schedule_utils::combine_date_time(date, time) {
                Ok(requested_at) => {
                    if requested_at <= now {
                        errors.push("自定义档期必须晚于当前时间".to_string());
                    }
                    if requested_at > now + Duration::days(MAX_ADVANCE_DAYS) {
                        errors.push(format!(
                            "自定义档期最多只能提前 {} 天预约",
                            MAX_ADVANCE_DAYS
                        ));
                    }
                }
                Err(_) => errors.push("自定义档期的日期或时间格式无效".to_string()),
            },
            _ => errors.push("自定义档期需要同时提供日期和时间".to_string()),
        }
    }

    if item.duration_days < MIN_DURATION_DAYS || item.duration_days > MAX_DURATION_DAYS {
        errors.push(format!(
            "拍卖时长必须在 {} 到 {} 天之间，当前为 {} 天",
            MIN_DURATION_DAYS, MAX_DURATION_DAYS, item.duration_days
        ));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// Produce ranked candidate remedies for a conflicting custom request.
///
/// Scores favour solutions that touch fewer auctions and displace them less;
/// they order the list for display and are never used to auto-apply
/// anything — `apply_resolution` is a separate, deliberate call.
pub fn propose_resolutions(
    requested: &ScheduleItem,
    conflicts: &[Conflict],
    existing: &[ScheduleItem],
) -> AppResult<Vec<ResolutionSolution>> {
    propose_resolutions_at(requested, conflicts, existing, schedule_utils::now_fixed())
}

pub fn propose_resolutions_at(
    requested: &ScheduleItem,
    conflicts: &[Conflict],
    existing: &[ScheduleItem],
    now: DateTime<FixedOffset>,
) -> AppResult<Vec<ResolutionSolution>> {
    if conflicts.is_empty() {
        return Ok(Vec::new());
    }

    let mut affected_ids: Vec<String> = Vec::new();
    for conflict in conflicts {
        if !affected_ids.contains(&conflict.item_id) {
            affected_ids.push(conflict.item_id.clone());
        }
    }
    let affected_count = affected_ids.len();

    let mut solutions = vec![
        build_pause_solution(requested, &affected_ids, existing)?,
        build_reschedule_solution(requested, &affected_ids, existing, now)?,
        build_reject_solution(requested, affected_count),
        build_overlap_solution(&affected_ids),
    ];

    solutions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    Ok(solutions)
}

fn build_pause_solution(
    requested: &ScheduleItem,
    affected_ids: &[String],
    existing: &[ScheduleItem],
) -> AppResult<ResolutionSolution> {
    // Paused auctions resume one after another once the custom item ends.
    let mut new_schedule = Vec::new();
    let mut resume_cursor =
        schedule_utils::parse_optional_datetime(requested.scheduled_end_at.as_ref())?;

    if let Some(mut cursor) = resume_cursor.take() {
        for id in affected_ids {
            if let Some(item) = existing.iter().find(|item| &item.id == id) {
                new_schedule.push(ScheduleAssignment {
                    item_id: id.clone(),
                    start_at: schedule_utils::format_datetime(cursor),
                });
                cursor = schedule_utils::add_days(cursor, item.duration_days.max(1))?;
            }
        }
    }

    let score = clamp_score(9.0 - (affected_ids.len() as f64 - 1.0) * 1.5);
    Ok(ResolutionSolution {
        id: Uuid::new_v4().to_string(),
        kind: SolutionKind::Pause,
        description: format!(
            "暂停 {} 个冲突拍卖，在定制档期《{}》结束后自动恢复",
            affected_ids.len(),
            requested.title
        ),
        affected_item_ids: affected_ids.to_vec(),
        new_schedule,
        pros: vec![
            "定制档期保持原请求时间".to_string(),
            "被暂停的拍卖会自动恢复，无需重新排队".to_string(),
        ],
        cons: vec![
            "进行中的拍卖会被打断，竞拍者体验受影响".to_string(),
            "恢复时间取决于定制档期的时长".to_string(),
        ],
        score,
    })
}

fn build_reschedule_solution(
    requested: &ScheduleItem,
    affected_ids: &[String],
    existing: &[ScheduleItem],
    now: DateTime<FixedOffset>,
) -> AppResult<ResolutionSolution> {
    let mut new_schedule = Vec::new();
    let mut cons = vec!["被改期的拍卖会失去原有时段".to_string()];
    let mut total_displacement_days = 0.0;
    let mut moved = 0usize;

    // The requested window joins the occupied set so a moved auction cannot
    // land back on top of it.
    let mut pool: Vec<ScheduleItem> = existing.to_vec();
    pool.push(requested.clone());

    for id in affected_ids {
        let Some(item) = existing.iter().find(|item| &item.id == id) else {
            continue;
        };

        let alternatives = slot_finder::generate_alternative_times_from(item, &pool, now)?;
        match alternatives.first() {
            Some(slot) => {
                let new_start = schedule_utils::parse_datetime(slot)?;
                if let Some(old_start) =
                    schedule_utils::parse_optional_datetime(item.scheduled_start_at.as_ref())?
                {
                    total_displacement_days +=
                        (new_start - old_start).num_hours().abs() as f64 / 24.0;
                }
                new_schedule.push(ScheduleAssignment {
                    item_id: id.clone(),
                    start_at: slot.clone(),
                });
                moved += 1;

                // Keep later reschedules away from this new window too.
                let mut shadow = item.clone();
                shadow.scheduled_start_at = Some(slot.clone());
                shadow.scheduled_end_at = Some(schedule_utils::format_datetime(
                    schedule_utils::add_days(new_start, item.duration_days.max(1))?,
                ));
                pool.push(shadow);
            }
            Option::None => {
                cons.push(format!("拍卖《{}》在 30 天内找不到空闲时段", item.title));
            }
        }
    }

    let average_displacement = if moved > 0 {
        total_displacement_days / moved as f64
    } else {
        0.0
    };
    let score = clamp_score(
        8.0 - (affected_ids.len() as f64 - 1.0) - average_displacement * 0.2
            - if moved < affected_ids.len() { 2.0 } else { 0.0 },
    );

    Ok(ResolutionSolution {
        id: Uuid::new_v4().to_string(),
        kind: SolutionKind::Reschedule,
        description: format!(
            "将 {} 个冲突拍卖改期到最近的空闲时段",
            affected_ids.len()
        ),
        affected_item_ids: affected_ids.to_vec(),
        new_schedule,
        pros: vec![
            "定制档期保持原请求时间".to_string(),
            "所有拍卖最终都能完整进行".to_string(),
        ],
        cons,
        score,
    })
}

fn build_reject_solution(requested: &ScheduleItem, affected_count: usize) -> ResolutionSolution {
    ResolutionSolution {
        id: Uuid::new_v4().to_string(),
        kind: SolutionKind::Reject,
        description: format!(
            "拒绝定制档期《{}》，作品回到普通队列按优先级排期",
            requested.title
        ),
        affected_item_ids: vec![requested.id.clone()],
        new_schedule: Vec::new(),
        pros: vec![
            "已承诺的拍卖时间表完全不受影响".to_string(),
            "作品仍会被排期，只是失去定制时间".to_string(),
        ],
        cons: vec![
            "艺术家的定制请求未被满足".to_string(),
            format!("与 {} 个现有拍卖的冲突未被正面解决", affected_count),
        ],
        score: clamp_score(4.0),
    }
}

fn build_overlap_solution(affected_ids: &[String]) -> ResolutionSolution {
    ResolutionSolution {
        id: Uuid::new_v4().to_string(),
        kind: SolutionKind::Overlap,
        description: format!(
            "允许与 {} 个现有拍卖并行进行（策略豁免）",
            affected_ids.len()
        ),
        affected_item_ids: affected_ids.to_vec(),
        new_schedule: Vec::new(),
        pros: vec!["所有拍卖都保持原时间，无任何改动".to_string()],
        cons: vec![
            "并行拍卖会分散竞拍者注意力".to_string(),
            "打破不重叠约束，需要业务规则明确允许".to_string(),
        ],
        score: clamp_score(2.5 - (affected_ids.len() as f64 - 1.0) * 0.5),
    }
}

/// Apply the human-selected solution to an in-memory snapshot of the
/// timeline. This is the explicit boundary between proposal and effect: the
/// engine never calls it on its own. The caller runs the allocator
/// afterwards to rebuild queue positions.
pub fn apply_resolution(
    mut items: Vec<ScheduleItem>,
    solution: &ResolutionSolution,
) -> AppResult<Vec<ScheduleItem>> {
    match solution.kind {
        SolutionKind::Pause | SolutionKind::Reschedule => {
            for assignment in &solution.new_schedule {
                let start = schedule_utils::parse_datetime(&assignment.start_at)?;
                if let Some(item) = items.iter_mut().find(|item| item.id == assignment.item_id) {
                    let end = schedule_utils::add_days(start, item.duration_days.max(1))?;
                    item.scheduled_start_at = Some(schedule_utils::format_datetime(start));
                    item.scheduled_end_at = Some(schedule_utils::format_datetime(end));
                    item.scheduling_mode = SchedulingMode::Custom;
                }
            }
        }
        SolutionKind::Reject => {
            for id in &solution.affected_item_ids {
                if let Some(item) = items.iter_mut().find(|item| &item.id == id) {
                    item.scheduling_mode = SchedulingMode::Basic;
                    item.custom_date = None;
                    item.custom_time = None;
                    item.scheduled_start_at = None;
                    item.scheduled_end_at = None;
                    item.queue_position = None;
                }
            }
        }
        SolutionKind::Overlap => {
            // Deliberate invariant override: windows stand as they are.
            info!(
                target: "app::scheduling",
                solution_id = %solution.id,
                affected = solution.affected_item_ids.len(),
                "overlap resolution selected, minimum-gap invariant overridden by decision"
            );
        }
    }
    Ok(items)
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 10.0)
}
