//! Background Tasks Module
//!
//! Runs caller-supplied work periodically on a dedicated worker.
//!
//! # Components
//! - `RecurringTask`: validated fixed-delay schedule, started once
//! - `ScheduleHandle`: stop, shut down and inspect a started schedule
//! - `TimeUnit`: unit for the initial delay and interval

mod recurring;
mod unit;

pub use recurring::{RecurringTask, RecurringTaskBuilder, RunStats, ScheduleHandle, Task};
pub use unit::TimeUnit;
