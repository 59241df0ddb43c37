// Scheduler module: recurring cron trigger driving the scan engine

pub mod engine;

pub use engine::{BirthdayScheduler, Scheduler, SchedulerConfig, SchedulerState};
