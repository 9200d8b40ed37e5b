//! Error types for the telemetry path and configuration loading.
//!
//! Tap callbacks themselves use `anyhow::Error` (see [`crate::hooks::TapResult`]);
//! those errors belong to the host and are never wrapped or replaced here.

use std::path::PathBuf;
use thiserror::Error;

/// Failures inside tapscope itself.
///
/// None of these are ever surfaced through an instrumented tap. The
/// interceptor logs them and lets the original outcome through.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A sink implementation rejected the submission
    #[error("Telemetry sink rejected records for hook '{hook}': {reason}")]
    SinkRejected { hook: String, reason: String },

    /// Failed to read an instrumentation config file
    #[error("Failed to read instrumentation config from {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML instrumentation config
    #[error("Failed to parse instrumentation config (YAML)")]
    ConfigParseYaml {
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Failed to parse JSON instrumentation config
    #[error("Failed to parse instrumentation config (JSON)")]
    ConfigParseJson {
        #[source]
        source: serde_json::Error,
    },
}

impl TelemetryError {
    /// Log an isolated telemetry-path failure.
    ///
    /// Called wherever the interceptor swallows an error so the host build
    /// is unaffected.
    pub fn log_isolated(&self) {
        tracing::warn!(target: "tapscope::telemetry", "Telemetry failure isolated from build: {}", self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_rejected_message() {
        let err = TelemetryError::SinkRejected {
            hook: "compile".into(),
            reason: "queue full".into(),
        };
        assert_eq!(
            err.to_string(),
            "Telemetry sink rejected records for hook 'compile': queue full"
        );
    }

    #[test]
    fn test_config_read_keeps_source() {
        use std::error::Error as _;

        let err = TelemetryError::ConfigRead {
            path: PathBuf::from("missing.yml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "nope"),
        };
        assert!(err.to_string().contains("missing.yml"));
        assert!(err.source().is_some());
    }
}
