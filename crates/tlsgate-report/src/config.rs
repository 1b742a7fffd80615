use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReporterConfigError {
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
    #[error("extra_indicator_phrases contains an empty phrase")]
    EmptyIndicatorPhrase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReporterConfig {
    pub extra_indicator_phrases: Vec<String>,
    pub rolling_window_seconds: u64,
    pub max_raw_text_bytes: usize,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            extra_indicator_phrases: Vec::new(),
            rolling_window_seconds: 300,
            max_raw_text_bytes: 4096,
        }
    }
}

impl ReporterConfig {
    pub fn validate(&self) -> Result<(), ReporterConfigError> {
        if self.rolling_window_seconds == 0 {
            return Err(ReporterConfigError::ZeroValue("rolling_window_seconds"));
        }
        if self.max_raw_text_bytes == 0 {
            return Err(ReporterConfigError::ZeroValue("max_raw_text_bytes"));
        }
        if self
            .extra_indicator_phrases
            .iter()
            .any(|phrase| phrase.trim().is_empty())
        {
            return Err(ReporterConfigError::EmptyIndicatorPhrase);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ReporterConfig, ReporterConfigError};

    #[test]
    fn default_config_validates() {
        assert_eq!(ReporterConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_rolling_window_is_rejected() {
        let config = ReporterConfig {
            rolling_window_seconds: 0,
            ..ReporterConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ReporterConfigError::ZeroValue("rolling_window_seconds"))
        );
    }

    #[test]
    fn zero_raw_text_budget_is_rejected() {
        let config = ReporterConfig {
            max_raw_text_bytes: 0,
            ..ReporterConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ReporterConfigError::ZeroValue("max_raw_text_bytes"))
        );
    }

    #[test]
    fn blank_extra_phrase_is_rejected() {
        let config = ReporterConfig {
            extra_indicator_phrases: vec!["quic reset".to_string(), "   ".to_string()],
            ..ReporterConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ReporterConfigError::EmptyIndicatorPhrase)
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ReporterConfig = serde_json::from_str("{}").expect("empty config");
        assert_eq!(config, ReporterConfig::default());

        let config: ReporterConfig =
            serde_json::from_str(r#"{"rolling_window_seconds": 60}"#).expect("partial config");
        assert_eq!(config.rolling_window_seconds, 60);
        assert_eq!(config.max_raw_text_bytes, 4096);
    }

    #[test]
    fn unknown_config_fields_are_rejected() {
        let result = serde_json::from_str::<ReporterConfig>(r#"{"rolling_window": 60}"#);
        assert!(result.is_err());
    }
}
