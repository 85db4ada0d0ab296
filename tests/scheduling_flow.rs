use auctionhall_scheduler::db::DbPool;
use auctionhall_scheduler::models::conflict::SolutionKind;
use auctionhall_scheduler::models::schedule_item::{
    ItemStatus, Priority, ScheduleItem, ScheduleItemInput, SchedulingMode,
};
use auctionhall_scheduler::services::schedule_utils;
use auctionhall_scheduler::services::scheduling_service::SchedulingService;
use chrono::Duration;
use tempfile::tempdir;

fn basic_input(title: &str, priority: Priority) -> ScheduleItemInput {
    ScheduleItemInput {
        title: title.to_string(),
        artist_name: "Vera".to_string(),
        artist_id: "artist-7".to_string(),
        category: Some("photography".to_string()),
        duration_days: 2,
        scheduling_mode: Some(SchedulingMode::Basic),
        custom_date: None,
        custom_time: None,
        priority: Some(priority),
    }
}

fn assert_no_overlap(items: &[ScheduleItem]) {
    let windows: Vec<_> = items
        .iter()
        .filter(|item| item.is_approved() && item.has_resolved_window())
        .map(|item| {
            (
                schedule_utils::parse_datetime(item.scheduled_start_at.as_ref().unwrap())
                    .expect("parse start"),
                schedule_utils::parse_datetime(item.scheduled_end_at.as_ref().unwrap())
                    .expect("parse end"),
                item.id.clone(),
            )
        })
        .collect();

    for (i, (a_start, a_end, a_id)) in windows.iter().enumerate() {
        for (b_start, b_end, b_id) in windows.iter().skip(i + 1) {
            assert!(
                !(a_start < b_end && b_start < a_end),
                "items {a_id} and {b_id} overlap"
            );
        }
    }
}

#[test]
fn queue_commit_review_and_resolution_flow() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("auctionhall.sqlite")).expect("db pool");
    let service = SchedulingService::new(pool);

    // Submission order low, high, medium: priority must win over arrival.
    let low = service
        .submit_item(basic_input("Dawn Chorus", Priority::Low))
        .expect("submit low");
    let high = service
        .submit_item(basic_input("Fracture", Priority::High))
        .expect("submit high");
    let medium = service
        .submit_item(basic_input("Second Light", Priority::Medium))
        .expect("submit medium");

    for item in [&low, &high, &medium] {
        assert_eq!(item.status, ItemStatus::Pending);
        service
            .set_status(&item.id, ItemStatus::Approved)
            .expect("approve");
    }

    let committed = service.commit_timeline().expect("commit timeline");
    let approved: Vec<&ScheduleItem> = committed.iter().filter(|i| i.is_approved()).collect();
    assert_eq!(approved.len(), 3);
    assert_eq!(approved[0].id, high.id);
    assert_eq!(approved[1].id, medium.id);
    assert_eq!(approved[2].id, low.id);
    for (idx, item) in approved.iter().enumerate() {
        assert_eq!(item.queue_position, Some(idx as i64 + 1));
        assert!(item.has_resolved_window());
    }
    assert_no_overlap(&committed);

    // A curated request landing in the middle of the committed queue.
    let custom_start_day = schedule_utils::now_fixed() + Duration::days(2);
    let custom = service
        .submit_item(ScheduleItemInput {
            title: "Vault of Mirrors".to_string(),
            artist_name: "Ode".to_string(),
            artist_id: "artist-11".to_string(),
            category: Some("generative".to_string()),
            duration_days: 3,
            scheduling_mode: Some(SchedulingMode::Custom),
            custom_date: Some(custom_start_day.format("%Y-%m-%d").to_string()),
            custom_time: Some("12:00".to_string()),
            priority: None,
        })
        .expect("submit custom");

    let custom = service
        .set_status(&custom.id, ItemStatus::Approved)
        .expect("approve custom");
    assert!(custom.has_resolved_window());

    let review = service
        .review_custom_request(&custom.id)
        .expect("review custom request");
    assert!(!review.conflicts.is_empty());
    assert_eq!(review.solutions.len(), 4);
    for pair in review.solutions.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let reschedule = review
        .solutions
        .iter()
        .find(|solution| solution.kind == SolutionKind::Reschedule)
        .expect("reschedule solution");

    let committed = service
        .select_resolution(reschedule)
        .expect("apply resolution");
    assert_no_overlap(&committed);

    // The curated window is authoritative and survives reallocation.
    let placed_custom = committed
        .iter()
        .find(|item| item.id == custom.id)
        .expect("custom item placed");
    assert_eq!(placed_custom.scheduled_start_at, custom.scheduled_start_at);
    assert_eq!(placed_custom.scheduled_end_at, custom.scheduled_end_at);
    assert!(placed_custom.queue_position.is_some());
}

#[test]
fn submission_is_gated_by_validation() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("auctionhall.sqlite")).expect("db pool");
    let service = SchedulingService::new(pool);

    let mut input = basic_input("Too Long", Priority::Medium);
    input.duration_days = 15;
    assert!(service.submit_item(input).is_err());

    let mut input = basic_input("Dateless", Priority::Medium);
    input.scheduling_mode = Some(SchedulingMode::Custom);
    assert!(service.submit_item(input).is_err());

    assert!(service.list_timeline().expect("timeline").is_empty());
}

#[test]
fn emergency_reorganization_promotes_and_recommits() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("auctionhall.sqlite")).expect("db pool");
    let service = SchedulingService::new(pool);

    let ahead = service
        .submit_item(basic_input("Ahead", Priority::Medium))
        .expect("submit");
    let urgent = service
        .submit_item(basic_input("Urgent", Priority::Low))
        .expect("submit");
    for id in [&ahead.id, &urgent.id] {
        service.set_status(id, ItemStatus::Approved).expect("approve");
    }
    let committed = service.commit_timeline().expect("commit");
    assert_eq!(committed[0].id, ahead.id);

    let committed = service
        .emergency_reorganization(&urgent.id)
        .expect("emergency reorganization");
    let promoted = committed
        .iter()
        .find(|item| item.id == urgent.id)
        .expect("promoted item");
    assert_eq!(promoted.priority, Priority::High);
    // Medium vs promoted High: the urgent item now leads the queue.
    assert_eq!(committed[0].id, urgent.id);
    assert_no_overlap(&committed);
}
