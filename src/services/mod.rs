pub mod conflict_detector;
pub mod resolution;
pub mod schedule_utils;
pub mod scheduling_service;
pub mod slot_allocator;
pub mod slot_finder;
