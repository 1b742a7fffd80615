use std::io;
use std::sync::Arc;
use std::time::Duration;

use tlsgate_classify::{
    advise, classify_normalized, normalize_error_text, FailureIndicatorSet,
    DEFAULT_INDICATOR_PHRASES,
};
use tlsgate_observe::{ClassifiedFailure, ReportSink, SessionContext};

mod config;
mod diagnostics;
mod log_sink;
mod report_log;

pub use config::{ReporterConfig, ReporterConfigError};
pub use diagnostics::{
    DiagnosticsSnapshot, FailureCounterUpdate, FailureDiagnostics, HostFailureSnapshot,
};
pub use log_sink::LogReportSink;
pub use report_log::{FailureLogConfig, FailureLogRecord, FailureLogWriter, FAILURE_LOG_SCHEMA};

/// Turns raw TLS error text into classified, remediated failure reports.
///
/// One reporter serves every connection of the embedding proxy; `report` is
/// callable concurrently and never panics. Classification runs on the
/// truncated text so the emitted record stays self-consistent.
pub struct FailureReporter {
    indicators: FailureIndicatorSet,
    max_raw_text_bytes: usize,
    sink: Arc<dyn ReportSink>,
    diagnostics: Arc<FailureDiagnostics>,
}

impl FailureReporter {
    pub fn new(
        config: ReporterConfig,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self, ReporterConfigError> {
        config.validate()?;
        let indicators = FailureIndicatorSet::from_phrases(
            DEFAULT_INDICATOR_PHRASES
                .iter()
                .map(|phrase| phrase.to_string())
                .chain(config.extra_indicator_phrases.iter().cloned()),
        );
        Ok(Self {
            indicators,
            max_raw_text_bytes: config.max_raw_text_bytes,
            sink,
            diagnostics: Arc::new(FailureDiagnostics::new(Duration::from_secs(
                config.rolling_window_seconds,
            ))),
        })
    }

    pub fn report(&self, raw_text: &str, context: SessionContext) -> ClassifiedFailure {
        let raw_text = truncate_to_budget(raw_text, self.max_raw_text_bytes);
        let normalized = normalize_error_text(&raw_text);
        let is_tls_related = self.indicators.matches_normalized(&normalized);
        let cause = classify_normalized(&normalized);
        let remediation = advise(cause);

        let report =
            ClassifiedFailure::new(raw_text, is_tls_related, cause, remediation, context);
        self.diagnostics
            .record(&report.context.server_host, report.context.phase, cause);
        self.sink.emit(&report);
        report
    }

    pub fn report_io_error(
        &self,
        error: &io::Error,
        context: SessionContext,
    ) -> ClassifiedFailure {
        self.report(&error.to_string(), context)
    }

    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }
}

fn truncate_to_budget(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
