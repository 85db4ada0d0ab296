pub mod schedule_repository;
