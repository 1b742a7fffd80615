use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tlsgate_classify::FailureCause;
use tlsgate_observe::FailurePhase;

const DEFAULT_ROLLING_WINDOW: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailureSnapshot {
    pub total_failures: u64,
    pub rolling_failures: u64,
    pub by_cause: BTreeMap<String, u64>,
    pub by_phase: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub total_failures: u64,
    pub hosts: BTreeMap<String, HostFailureSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureCounterUpdate {
    pub host_total_failures: u64,
    pub host_rolling_failures: u64,
    pub cause_total_failures: u64,
    pub global_total_failures: u64,
}

#[derive(Debug)]
pub struct FailureDiagnostics {
    rolling_window: Duration,
    state: Mutex<DiagnosticsState>,
}

#[derive(Debug, Default)]
struct DiagnosticsState {
    total_failures: u64,
    hosts: HashMap<String, HostCounters>,
}

#[derive(Debug, Default)]
struct HostCounters {
    total_failures: u64,
    by_cause: HashMap<&'static str, u64>,
    by_phase: HashMap<&'static str, u64>,
    rolling_timestamps: VecDeque<Instant>,
}

impl Default for FailureDiagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLING_WINDOW)
    }
}

impl FailureDiagnostics {
    pub fn new(rolling_window: Duration) -> Self {
        let window = if rolling_window.is_zero() {
            Duration::from_secs(1)
        } else {
            rolling_window
        };
        Self {
            rolling_window: window,
            state: Mutex::new(DiagnosticsState::default()),
        }
    }

    pub fn record(
        &self,
        host: &str,
        phase: FailurePhase,
        cause: FailureCause,
    ) -> FailureCounterUpdate {
        let now = Instant::now();
        let host = normalize_host(host);

        let mut state = self.lock_state();
        let (host_total_failures, host_rolling_failures, cause_total) = {
            let host_counters = state.hosts.entry(host).or_default();
            prune_rolling(host_counters, now, self.rolling_window);

            host_counters.total_failures += 1;
            host_counters.rolling_timestamps.push_back(now);
            let cause_total = increment_counter(&mut host_counters.by_cause, cause.code());
            increment_counter(&mut host_counters.by_phase, phase.as_str());
            (
                host_counters.total_failures,
                host_counters.rolling_timestamps.len() as u64,
                cause_total,
            )
        };

        state.total_failures += 1;

        FailureCounterUpdate {
            host_total_failures,
            host_rolling_failures,
            cause_total_failures: cause_total,
            global_total_failures: state.total_failures,
        }
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let now = Instant::now();
        let mut state = self.lock_state();

        let mut hosts = BTreeMap::new();
        for (host, counters) in &mut state.hosts {
            prune_rolling(counters, now, self.rolling_window);
            hosts.insert(
                host.clone(),
                HostFailureSnapshot {
                    total_failures: counters.total_failures,
                    rolling_failures: counters.rolling_timestamps.len() as u64,
                    by_cause: counters
                        .by_cause
                        .iter()
                        .map(|(cause, count)| (cause.to_string(), *count))
                        .collect(),
                    by_phase: counters
                        .by_phase
                        .iter()
                        .map(|(phase, count)| (phase.to_string(), *count))
                        .collect(),
                },
            );
        }

        DiagnosticsSnapshot {
            total_failures: state.total_failures,
            hosts,
        }
    }

    // The reporting path must not panic; counters stay usable even if a
    // previous holder panicked mid-update.
    fn lock_state(&self) -> MutexGuard<'_, DiagnosticsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn normalize_host(host: &str) -> String {
    let trimmed = host.trim();
    match trimmed.parse::<IpAddr>() {
        Ok(_) => trimmed.to_string(),
        Err(_) => trimmed.to_ascii_lowercase(),
    }
}

fn increment_counter(counters: &mut HashMap<&'static str, u64>, key: &'static str) -> u64 {
    let value = counters.entry(key).or_insert(0);
    *value += 1;
    *value
}

fn prune_rolling(counters: &mut HostCounters, now: Instant, window: Duration) {
    while let Some(timestamp) = counters.rolling_timestamps.front() {
        if now.duration_since(*timestamp) > window {
            counters.rolling_timestamps.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use tlsgate_classify::FailureCause;
    use tlsgate_observe::FailurePhase;

    use super::FailureDiagnostics;

    #[test]
    fn records_host_scoped_cause_and_phase_counts() {
        let diagnostics = FailureDiagnostics::new(Duration::from_secs(60));

        let first = diagnostics.record(
            "API.EXAMPLE.COM",
            FailurePhase::Handshake,
            FailureCause::Expired,
        );
        assert_eq!(first.host_total_failures, 1);
        assert_eq!(first.host_rolling_failures, 1);
        assert_eq!(first.cause_total_failures, 1);
        assert_eq!(first.global_total_failures, 1);

        let second = diagnostics.record(
            "api.example.com",
            FailurePhase::DataTransfer,
            FailureCause::Expired,
        );
        assert_eq!(second.host_total_failures, 2);
        assert_eq!(second.cause_total_failures, 2);
        assert_eq!(second.global_total_failures, 2);

        let snapshot = diagnostics.snapshot();
        assert_eq!(snapshot.total_failures, 2);
        let host = snapshot
            .hosts
            .get("api.example.com")
            .expect("host counters");
        assert_eq!(host.total_failures, 2);
        assert_eq!(host.rolling_failures, 2);
        assert_eq!(host.by_cause.get("expired"), Some(&2));
        assert_eq!(host.by_phase.get("handshake"), Some(&1));
        assert_eq!(host.by_phase.get("data_transfer"), Some(&1));
    }

    #[test]
    fn rolling_counter_expires_entries_outside_window() {
        let diagnostics = FailureDiagnostics::new(Duration::from_millis(30));
        let first = diagnostics.record(
            "service.local",
            FailurePhase::Handshake,
            FailureCause::Unknown,
        );
        assert_eq!(first.host_rolling_failures, 1);

        thread::sleep(Duration::from_millis(45));

        let second = diagnostics.record(
            "service.local",
            FailurePhase::Handshake,
            FailureCause::Unknown,
        );
        assert_eq!(second.host_total_failures, 2);
        assert_eq!(second.host_rolling_failures, 1);

        let snapshot = diagnostics.snapshot();
        let host = snapshot.hosts.get("service.local").expect("host counters");
        assert_eq!(host.total_failures, 2);
        assert_eq!(host.rolling_failures, 1);
    }

    #[test]
    fn ip_literal_hosts_are_preserved_verbatim() {
        let diagnostics = FailureDiagnostics::default();
        diagnostics.record("192.168.1.10", FailurePhase::Handshake, FailureCause::Unknown);

        let snapshot = diagnostics.snapshot();
        assert!(snapshot.hosts.contains_key("192.168.1.10"));
    }
}
