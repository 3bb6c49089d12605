pub mod signal;
pub mod uploads;
