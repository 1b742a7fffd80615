use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use tlsgate_observe::{ClassifiedFailure, ReportSink};

pub const FAILURE_LOG_SCHEMA: &str = "tlsgate-failure-log-v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureLogConfig {
    pub log_path: PathBuf,
    pub flush_every: usize,
}

impl FailureLogConfig {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            flush_every: 1,
        }
    }

    pub fn with_flush_every(mut self, flush_every: usize) -> Self {
        self.flush_every = flush_every.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureLogRecord {
    pub schema: &'static str,
    pub sequence_id: u64,
    pub session_id: u64,
    pub client_addr: String,
    pub server_host: String,
    pub server_port: u16,
    pub phase: &'static str,
    pub is_tls_related: bool,
    pub cause: &'static str,
    pub remediation: &'static str,
    pub raw_text: String,
    pub vpn_profile: Option<String>,
    pub occurred_at_unix_ms: u128,
}

#[derive(Debug)]
struct LogWriterState {
    writer: BufWriter<std::fs::File>,
    records_since_flush: usize,
}

/// Append-only JSON-lines writer for classified failures.
///
/// Write errors never reach the reporter: they are counted and the last one
/// is kept for inspection, matching the report path's no-panic contract.
#[derive(Debug)]
pub struct FailureLogWriter {
    config: FailureLogConfig,
    state: Mutex<LogWriterState>,
    next_sequence_id: AtomicU64,
    write_error_count: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl FailureLogWriter {
    pub fn new(config: FailureLogConfig) -> io::Result<Self> {
        if config.log_path.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "failure log path must not be empty",
            ));
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_path)?;
        Ok(Self {
            config,
            state: Mutex::new(LogWriterState {
                writer: BufWriter::new(file),
                records_since_flush: 0,
            }),
            next_sequence_id: AtomicU64::new(1),
            write_error_count: AtomicU64::new(0),
            last_error: Mutex::new(None),
        })
    }

    pub fn flush(&self) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.writer.flush()
    }

    pub fn write_error_count(&self) -> u64 {
        self.write_error_count.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write_record(&self, report: &ClassifiedFailure) -> io::Result<()> {
        let record = self.failure_log_record(report);
        let mut line = serde_json::to_vec(&record)
            .map_err(|error| io::Error::other(format!("serialize failure log record: {error}")))?;
        line.push(b'\n');

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.writer.write_all(&line)?;
        state.records_since_flush = state.records_since_flush.saturating_add(1);
        if state.records_since_flush >= self.config.flush_every {
            state.writer.flush()?;
            state.records_since_flush = 0;
        }
        Ok(())
    }

    fn failure_log_record(&self, report: &ClassifiedFailure) -> FailureLogRecord {
        FailureLogRecord {
            schema: FAILURE_LOG_SCHEMA,
            sequence_id: self.next_sequence_id.fetch_add(1, Ordering::Relaxed),
            session_id: report.context.session_id,
            client_addr: report.context.client_addr.clone(),
            server_host: report.context.server_host.clone(),
            server_port: report.context.server_port,
            phase: report.context.phase.as_str(),
            is_tls_related: report.is_tls_related,
            cause: report.cause.code(),
            remediation: report.remediation,
            raw_text: report.raw_text.clone(),
            vpn_profile: report.context.vpn_profile.clone(),
            occurred_at_unix_ms: report.occurred_at_unix_ms,
        }
    }
}

impl ReportSink for FailureLogWriter {
    fn emit(&self, report: &ClassifiedFailure) {
        if let Err(error) = self.write_record(report) {
            self.write_error_count.fetch_add(1, Ordering::Relaxed);
            *self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(error.to_string());
        }
    }
}
