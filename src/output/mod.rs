//! Output of probe lines and the statistics report

mod formatter;

pub use formatter::{format_duration_ms, format_trip_time, timestamp, ResultFormatter};
