use chrono::{
    offset::LocalResult, DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc,
};
use serde_json::json;

use crate::error::{AppError, AppResult};

/// Minimum gap required between two committed auction windows.
pub const MIN_GAP_MS: i64 = 3_600_000;

pub fn parse_datetime(value: &str) -> AppResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|err| {
        AppError::validation_with_details(
            "无效的时间格式",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}

pub fn parse_optional_datetime(value: Option<&String>) -> AppResult<Option<DateTime<FixedOffset>>> {
    match value {
        Some(raw) => Ok(Some(parse_datetime(raw)?)),
        Option::None => Ok(Option::None),
    }
}

pub fn format_datetime(dt: DateTime<FixedOffset>) -> String {
    dt.to_rfc3339()
}

pub fn now_fixed() -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(0).expect("UTC offset should exist");
    Utc::now().with_timezone(&offset)
}

pub fn add_days(dt: DateTime<FixedOffset>, days: i64) -> AppResult<DateTime<FixedOffset>> {
    dt.checked_add_signed(Duration::days(days))
        .ok_or_else(|| AppError::validation("时间计算超出范围"))
}

pub fn add_hours(dt: DateTime<FixedOffset>, hours: i64) -> AppResult<DateTime<FixedOffset>> {
    dt.checked_add_signed(Duration::hours(hours))
        .ok_or_else(|| AppError::validation("时间计算超出范围"))
}

pub fn ensure_window(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> AppResult<()> {
    if end <= start {
        Err(AppError::validation("时间窗口结束时间必须晚于开始"))
    } else {
        Ok(())
    }
}

/// Half-open interval semantics: a window ending exactly when another starts
/// does not overlap it.
pub fn overlaps(
    a_start: DateTime<FixedOffset>,
    a_end: DateTime<FixedOffset>,
    b_start: DateTime<FixedOffset>,
    b_end: DateTime<FixedOffset>,
) -> AppResult<bool> {
    ensure_window(a_start, a_end)?;
    ensure_window(b_start, b_end)?;
    Ok(a_start < b_end && b_start < a_end)
}

/// Smallest boundary distance between two windows in milliseconds: how close
/// one window's start sits to the other window's end, in either direction.
pub fn boundary_gap_ms(
    a_start: DateTime<FixedOffset>,
    a_end: DateTime<FixedOffset>,
    b_start: DateTime<FixedOffset>,
    b_end: DateTime<FixedOffset>,
) -> i64 {
    let start_to_end = (a_start - b_end).num_milliseconds().abs();
    let end_to_start = (a_end - b_start).num_milliseconds().abs();
    start_to_end.min(end_to_start)
}

/// Combine a `YYYY-MM-DD` date and a `HH:MM` time into a UTC instant.
pub fn combine_date_time(date: &str, time: &str) -> AppResult<DateTime<FixedOffset>> {
    let naive_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|err| {
        AppError::validation_with_details(
            "无效的日期格式",
            json!({"value": date, "error": err.to_string()}),
        )
    })?;
    let naive_time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|err| {
        AppError::validation_with_details(
            "无效的时间格式",
            json!({"value": time, "error": err.to_string()}),
        )
    })?;

    let offset = FixedOffset::east_opt(0).expect("UTC offset should exist");
    match offset.from_local_datetime(&naive_date.and_time(naive_time)) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(first, _) => Ok(first),
        LocalResult::None => Err(AppError::validation("无法解析日期时间组合")),
    }
}

/// Rebuild an instant on the same calendar day with a different wall-clock
/// time, keeping the original offset.
pub fn at_time_of_day(
    day: DateTime<FixedOffset>,
    naive_time: NaiveTime,
) -> DateTime<FixedOffset> {
    let offset = *day.offset();
    let naive = day.date_naive().and_time(naive_time);
    match offset.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, _) => first,
        LocalResult::None => day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(day: u32, hour: u32) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(0).expect("offset");
        let naive = NaiveDate::from_ymd_opt(2025, 6, day)
            .expect("valid date")
            .and_hms_opt(hour, 0, 0)
            .expect("valid time");
        offset
            .from_local_datetime(&naive)
            .single()
            .expect("valid datetime")
    }

    #[test]
    fn touching_windows_do_not_overlap() -> AppResult<()> {
        assert!(!overlaps(dt(1, 9), dt(1, 12), dt(1, 12), dt(1, 15))?);
        assert!(overlaps(dt(1, 9), dt(1, 13), dt(1, 12), dt(1, 15))?);
        Ok(())
    }

    #[test]
    fn boundary_gap_measures_closest_edges() {
        // day 1 ends 12:00, day 2 starts 09:00 the next day: 21 hours apart
        let gap = boundary_gap_ms(dt(1, 9), dt(1, 12), dt(2, 9), dt(2, 12));
        assert_eq!(gap, 21 * MIN_GAP_MS);

        let close = boundary_gap_ms(dt(1, 9), dt(1, 12), dt(1, 12), dt(1, 15));
        assert_eq!(close, 0);
    }

    #[test]
    fn combine_date_time_rejects_bad_input() {
        assert!(combine_date_time("2025-06-01", "12:00").is_ok());
        assert!(combine_date_time("06/01/2025", "12:00").is_err());
        assert!(combine_date_time("2025-06-01", "noon").is_err());
    }
}
