use log::{debug, info, warn};
use tlsgate_observe::{ClassifiedFailure, ReportSink};

/// Emits classified failures through the `log` facade.
///
/// Certificate-related failures get the structured multi-line report the
/// operator acts on; unrelated failures stay at debug so the proxy's own
/// connection logging keeps ownership of them.
#[derive(Debug, Default)]
pub struct LogReportSink;

impl ReportSink for LogReportSink {
    fn emit(&self, report: &ClassifiedFailure) {
        let context = &report.context;
        if !report.is_tls_related {
            debug!(
                "non-TLS failure at {}:{} during {}: {}",
                context.server_host,
                context.server_port,
                context.phase.as_str(),
                report.raw_text
            );
            return;
        }

        warn!("TLS certificate issue detected");
        warn!("  target: {}:{}", context.server_host, context.server_port);
        warn!("  phase: {}", context.phase.as_str());
        warn!("  error: {}", report.raw_text);
        warn!("  cause: {}", report.cause.code());
        warn!("  action: {}", report.remediation);
        if let Some(profile) = &context.vpn_profile {
            info!("  note: VPN routing ({profile}) may affect certificate validation");
            info!("  consider: the certificate might be valid but blocked by VPN policy");
        }
    }
}

#[cfg(test)]
mod tests {
    use tlsgate_classify::FailureCause;
    use tlsgate_observe::{ClassifiedFailure, FailurePhase, ReportSink, SessionContext};

    use super::LogReportSink;

    #[test]
    fn emit_handles_vpn_and_non_tls_reports() {
        let sink = LogReportSink;
        let context = SessionContext {
            session_id: 1,
            client_addr: "127.0.0.1:50000".to_string(),
            server_host: "api.example.com".to_string(),
            server_port: 443,
            phase: FailurePhase::Handshake,
            vpn_profile: Some("corp-vpn".to_string()),
        };

        sink.emit(&ClassifiedFailure::new(
            "certificate has expired".to_string(),
            true,
            FailureCause::Expired,
            "renew the expired certificate on the target server",
            context.clone(),
        ));
        sink.emit(&ClassifiedFailure::new(
            "connection reset by peer".to_string(),
            false,
            FailureCause::Unknown,
            "investigate certificate validity and trust for the target host",
            context,
        ));
    }
}
