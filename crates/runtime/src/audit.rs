//! NDJSON (newline-delimited JSON) run-audit sink.
//!
//! One row per completed cycle, flushed immediately -- the process is
//! long-running and the audit stream must survive a kill.
//!
//! ```ignore
//! let mut sink = AuditSink::new(io::stdout());
//! sink.write_row(&row)?;
//! ```

use serde::Serialize;
use std::io::{self, BufWriter, Write};

/// One row per harness cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RunRow {
    pub connector_id: String,
    pub connector_name: String,
    pub work_id: Option<String>,
    /// `processed` or `failed`.
    pub status: String,
    pub message: String,
    pub started_at: String,
    pub duration_ms: u64,
}

/// NDJSON writer over any `Write` impl.
///
/// Each row is serialized directly via `serde_json::to_writer` (no
/// intermediate `String`) and flushed.
pub struct AuditSink<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl<W: Write> AuditSink<W> {
    /// Create a sink wrapping any writer (file, Vec<u8>, etc.).
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(8 * 1024, writer),
            rows_written: 0,
        }
    }

    /// Write and flush one run row.
    pub fn write_row(&mut self, row: &RunRow) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, row).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

/// ISO-8601 timestamp from unix seconds, without a chrono dependency.
pub fn iso8601(secs: u64) -> String {
    // Civil-date conversion (Howard Hinnant's algorithm), UTC only.
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;

    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };

    format!(
        "{y:04}-{m:02}-{d:02}T{:02}:{:02}:{:02}Z",
        rem / 3_600,
        (rem % 3_600) / 60,
        rem % 60,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndjson_rows_are_single_line_json() {
        let mut buf = Vec::new();
        let mut sink = AuditSink::new(&mut buf);

        let row = RunRow {
            connector_id: "c0ffee".into(),
            connector_name: "Threat Feed".into(),
            work_id: Some("work-42".into()),
            status: "processed".into(),
            message: "connector successfully run".into(),
            started_at: "2026-08-23T00:00:00Z".into(),
            duration_ms: 1_250,
        };
        sink.write_row(&row).unwrap();

        let failed = RunRow {
            work_id: None,
            status: "failed".into(),
            message: "Platform error: timeout".into(),
            ..row
        };
        sink.write_row(&failed).unwrap();

        let n = sink.finish().unwrap();
        assert_eq!(n, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["status"], "processed");
        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed["work_id"], serde_json::Value::Null);
    }

    #[test]
    fn iso8601_known_instants() {
        assert_eq!(iso8601(0), "1970-01-01T00:00:00Z");
        assert_eq!(iso8601(951_782_400), "2000-02-29T00:00:00Z");
        assert_eq!(iso8601(1_700_000_000), "2023-11-14T22:13:20Z");
    }
}
