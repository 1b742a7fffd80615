use std::sync::OnceLock;

/// Phrases that mark an error text as certificate-related, in match order.
///
/// Curated from the wording of common TLS stacks (rustls, openssl); stored
/// lower-case so matching stays a plain substring check against normalized
/// input.
pub const DEFAULT_INDICATOR_PHRASES: &[&str] = &[
    "certificate",
    "cert",
    "tls",
    "ssl",
    "handshake",
    "verification",
    "expired",
    "self-signed",
    "self signed",
    "untrusted",
    "revoked",
    "certificate chain",
    "certificate verify",
    "certificate authority",
    "unknown ca",
    "unknown issuer",
    "unable to get local issuer",
    "issuer certificate",
    "root certificate",
    "invalid peer certificate",
    "x509",
];

pub fn normalize_error_text(text: &str) -> String {
    text.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureIndicatorSet {
    phrases: Vec<String>,
}

impl Default for FailureIndicatorSet {
    fn default() -> Self {
        Self::from_phrases(DEFAULT_INDICATOR_PHRASES.iter().copied())
    }
}

impl FailureIndicatorSet {
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for phrase in phrases {
            let phrase = normalize_error_text(phrase.as_ref());
            if phrase.is_empty() || normalized.contains(&phrase) {
                continue;
            }
            normalized.push(phrase);
        }
        Self {
            phrases: normalized,
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matches_normalized(&normalize_error_text(text))
    }

    pub fn matches_normalized(&self, normalized: &str) -> bool {
        if normalized.is_empty() {
            return false;
        }
        self.phrases
            .iter()
            .any(|phrase| normalized.contains(phrase.as_str()))
    }
}

pub fn default_indicator_set() -> &'static FailureIndicatorSet {
    static DEFAULT_SET: OnceLock<FailureIndicatorSet> = OnceLock::new();
    DEFAULT_SET.get_or_init(FailureIndicatorSet::default)
}

pub fn is_tls_related(text: &str) -> bool {
    default_indicator_set().is_match(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCause {
    Expired,
    UntrustedOrSelfSigned,
    HandshakeFailure,
    VerificationFailure,
    Revoked,
    Unknown,
}

impl FailureCause {
    pub const ALL: [FailureCause; 6] = [
        Self::Expired,
        Self::UntrustedOrSelfSigned,
        Self::HandshakeFailure,
        Self::VerificationFailure,
        Self::Revoked,
        Self::Unknown,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::UntrustedOrSelfSigned => "untrusted_or_self_signed",
            Self::HandshakeFailure => "handshake_failure",
            Self::VerificationFailure => "verification_failure",
            Self::Revoked => "revoked",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CauseRule {
    pub cause: FailureCause,
    pub any_of: &'static [&'static str],
}

/// Ordered cause rules; the first rule whose phrase set matches wins.
///
/// The ordering is a contract: failure texts routinely contain phrases from
/// several rules (a handshake failure that also mentions "certificate
/// verify"), and earlier rules name the more diagnostically useful cause.
pub const CAUSE_RULES: &[CauseRule] = &[
    CauseRule {
        cause: FailureCause::Expired,
        any_of: &["expired"],
    },
    CauseRule {
        cause: FailureCause::UntrustedOrSelfSigned,
        any_of: &[
            "self-signed",
            "self signed",
            "untrusted",
            "unknown ca",
            "unknown issuer",
            "unknownissuer",
            "unable to get local issuer certificate",
        ],
    },
    CauseRule {
        cause: FailureCause::HandshakeFailure,
        any_of: &["handshake", "received fatal alert", "protocol version"],
    },
    CauseRule {
        cause: FailureCause::VerificationFailure,
        any_of: &["verify", "verification"],
    },
    CauseRule {
        cause: FailureCause::Revoked,
        any_of: &["revoked"],
    },
];

pub fn classify(text: &str) -> FailureCause {
    classify_normalized(&normalize_error_text(text))
}

pub fn classify_normalized(normalized: &str) -> FailureCause {
    for rule in CAUSE_RULES {
        if contains_any(normalized, rule.any_of) {
            return rule.cause;
        }
    }
    FailureCause::Unknown
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn advise(cause: FailureCause) -> &'static str {
    match cause {
        FailureCause::Expired => "renew the expired certificate on the target server",
        FailureCause::UntrustedOrSelfSigned => {
            "add the certificate to the trust store or deploy a CA-signed certificate"
        }
        FailureCause::HandshakeFailure => {
            "check certificate compatibility and the negotiated TLS version"
        }
        FailureCause::VerificationFailure => {
            "check the certificate chain and CA trust configuration"
        }
        FailureCause::Revoked => "replace the revoked certificate with a freshly signed one",
        FailureCause::Unknown => "investigate certificate validity and trust for the target host",
    }
}
