pub mod conflict;
pub mod schedule_item;
