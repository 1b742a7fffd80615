use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tlsgate_classify::FailureCause;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePhase {
    Handshake,
    DataTransfer,
}

impl FailurePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Handshake => "handshake",
            Self::DataTransfer => "data_transfer",
        }
    }
}

/// Connection-scoped context supplied by the surrounding proxy.
///
/// The reporting core attaches this to each record untouched; `vpn_profile`
/// is an opaque platform hint and never feeds classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: u64,
    pub client_addr: String,
    pub server_host: String,
    pub server_port: u16,
    pub phase: FailurePhase,
    pub vpn_profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFailure {
    pub raw_text: String,
    pub is_tls_related: bool,
    pub cause: FailureCause,
    pub remediation: &'static str,
    pub context: SessionContext,
    pub occurred_at_unix_ms: u128,
}

impl ClassifiedFailure {
    pub fn new(
        raw_text: String,
        is_tls_related: bool,
        cause: FailureCause,
        remediation: &'static str,
        context: SessionContext,
    ) -> Self {
        Self {
            raw_text,
            is_tls_related,
            cause,
            remediation,
            context,
            occurred_at_unix_ms: now_unix_ms(),
        }
    }
}

pub trait ReportSink: Send + Sync {
    fn emit(&self, report: &ClassifiedFailure);
}

#[derive(Debug, Default)]
pub struct NoopReportSink;

impl ReportSink for NoopReportSink {
    fn emit(&self, _report: &ClassifiedFailure) {}
}

#[derive(Debug, Default, Clone)]
pub struct VecReportSink {
    reports: Arc<Mutex<Vec<ClassifiedFailure>>>,
}

impl VecReportSink {
    pub fn snapshot(&self) -> Vec<ClassifiedFailure> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReportSink for VecReportSink {
    fn emit(&self, report: &ClassifiedFailure) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
    }
}

fn now_unix_ms() -> u128 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis(),
        Err(_) => 0,
    }
}
