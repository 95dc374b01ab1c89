// src/tasks/mod.rs

pub mod crossing_scheduler;

pub use crossing_scheduler::{CrossingScheduler, period_start, spawn_crossing_scheduler};
