pub mod config;
pub mod error;
pub mod schedule;
pub mod storage;

pub use error::{ScheduleError, ScheduleResult};
