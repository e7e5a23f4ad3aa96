//! Per-probe lines and the final statistics report

use crate::error::{classify_error, Result};
use crate::models::ProbeResult;
use crate::stats::Summary;
use chrono::{DateTime, Local};
use std::io::Write;
use std::time::Duration;

const COLOR_RED: &str = "\x1b[0;31m";
const COLOR_RESET: &str = "\x1b[0m";

/// Writes probe results and the summary to a sink.
///
/// Failed lines are wrapped in red only when `is_terminal` is set; otherwise
/// output is plain so it can be piped or captured.
pub struct ResultFormatter<W: Write> {
    out: W,
    label: String,
    is_terminal: bool,
}

impl<W: Write> ResultFormatter<W> {
    /// `label` names the target in every line, e.g. `tcp://example.com:80`
    pub fn new(out: W, label: impl Into<String>, is_terminal: bool) -> Self {
        Self {
            out,
            label: label.into(),
            is_terminal,
        }
    }

    /// Render one probe result, including the trailing newline(s)
    pub fn format_result(&self, timestamp: &str, result: &ProbeResult) -> String {
        let time = format_duration_ms(result.duration);
        let dns = format_duration_ms(result.dns_duration);

        let mut line = match &result.error {
            Some(err) => {
                let (before, after) = if self.is_terminal {
                    (COLOR_RED, COLOR_RESET)
                } else {
                    ("", "")
                };
                format!(
                    "{}{}: Ping {}({}) Failed({}) - time={} dns={}{}",
                    before,
                    timestamp,
                    self.label,
                    result.address,
                    classify_error(err),
                    time,
                    dns,
                    after
                )
            }
            None => format!(
                "{}: Ping {}({}) {} - time={} dns={}",
                timestamp,
                self.label,
                result.address,
                if result.connected { "connected" } else { "Failed" },
                time,
                dns
            ),
        };

        if !result.meta.is_empty() {
            line.push(' ');
            line.push_str(&result.format_meta());
        }
        line.push('\n');

        if let Some(extra) = &result.extra {
            line.push(' ');
            line.push_str(extra.trim());
            line.push('\n');
        }

        line
    }

    /// Write one probe line stamped with the current local time
    pub fn print_result(&mut self, result: &ProbeResult) -> Result<()> {
        let line = self.format_result(&timestamp(Local::now()), result);
        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    pub fn format_summary(&self, summary: &Summary) -> String {
        format!(
            "\nPing statistics {}\n\
             \t{} probes sent.\n\
             \t{} successful, {} failed.\n\
             Approximate trip times:\n\
             \tMinimum = {}\n\
             \tMaximum = {}\n\
             \tAverage = {}\n\
             \tp50     = {}\n\
             \tp95     = {}\n\
             \tp99     = {}\n",
            self.label,
            summary.total,
            summary.successes,
            summary.failures,
            format_trip_time(summary.min),
            format_trip_time(summary.max),
            format_trip_time(summary.mean),
            format_trip_time(summary.p50),
            format_trip_time(summary.p95),
            format_trip_time(summary.p99),
        )
    }

    pub fn print_summary(&mut self, summary: &Summary) -> Result<()> {
        let report = self.format_summary(summary);
        self.out.write_all(report.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// `Jan  2 15:04:05.000` in local time
pub fn timestamp(now: DateTime<Local>) -> String {
    now.format("%b %e %H:%M:%S%.3f").to_string()
}

/// Milliseconds with three decimals, rounded to the microsecond
pub fn format_duration_ms(duration: Duration) -> String {
    let micros = (duration.as_nanos() + 500) / 1000;
    format!("{:.3}ms", micros as f64 / 1000.0)
}

/// Duration in its natural unit with three decimals (`10.000ms`, `1.500s`)
pub fn format_trip_time(duration: Duration) -> String {
    format!("{:.3?}", duration)
}
