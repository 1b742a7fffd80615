#![no_main]

use std::sync::Arc;
use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use tlsgate_observe::{FailurePhase, NoopReportSink, SessionContext};
use tlsgate_report::{FailureReporter, ReporterConfig};

fn reporter() -> &'static FailureReporter {
    static REPORTER: OnceLock<FailureReporter> = OnceLock::new();
    REPORTER.get_or_init(|| {
        FailureReporter::new(ReporterConfig::default(), Arc::new(NoopReportSink))
            .expect("default reporter config")
    })
}

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let phase = if data.len() % 2 == 0 {
        FailurePhase::Handshake
    } else {
        FailurePhase::DataTransfer
    };
    let context = SessionContext {
        session_id: data.len() as u64,
        client_addr: "127.0.0.1:50000".to_string(),
        server_host: "fuzz.example.com".to_string(),
        server_port: 443,
        phase,
        vpn_profile: None,
    };
    let report = reporter().report(&text, context);
    let _ = report.cause.code();
});
