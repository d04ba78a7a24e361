//! CLI-specific error types and exit code mapping

use lockwarden_audit::AuditError;
use lockwarden_core::error::LockwardenError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// The audit could not run (missing scan root, task failure).
    #[error("{0}")]
    Audit(#[from] AuditError),

    /// The audit completed and reported findings while `--fail-on-findings` was set.
    #[error("found {0} findings")]
    Findings(usize),

    /// Logging could not be initialised.
    #[error("logging error: {0}")]
    Logging(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from lockwarden-core.
    #[error("{0}")]
    Core(#[from] LockwardenError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | General / audit error                    |
    /// | 2    | Configuration error                      |
    /// | 4    | Findings reported (`--fail-on-findings`) |
    /// | 10   | IO error                                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_)
            | Self::Core(LockwardenError::Config(_))
            | Self::Audit(AuditError::Config { .. }) => 2,
            Self::Findings(_) => 4,
            Self::Io(_) | Self::Core(LockwardenError::Io(_)) => 10,
            Self::Audit(_) | Self::Logging(_) | Self::JsonSerialize(_) | Self::Core(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockwarden_core::error::ConfigError;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_core_config_error() {
        let err = CliError::from(LockwardenError::Config(ConfigError::FileNotFound {
            path: "lockwarden.toml".to_owned(),
        }));
        assert_eq!(err.exit_code(), 2, "core config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_audit_config_error() {
        let err = CliError::from(AuditError::Config {
            field: "scan.max_depth".to_owned(),
            reason: "must be greater than 0".to_owned(),
        });
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_missing_root() {
        let err = CliError::from(AuditError::RootNotFound {
            path: "/nope".to_owned(),
        });
        assert_eq!(err.exit_code(), 1, "missing scan root should return exit code 1");
        assert_eq!(err.to_string(), "scan root not found: /nope");
    }

    #[test]
    fn test_exit_code_findings() {
        let err = CliError::Findings(3);
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.to_string(), "found 3 findings");
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_json_serialize_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid json")
            .expect_err("should fail parsing");
        let err = CliError::JsonSerialize(json_err);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_error_display_config() {
        let err = CliError::Config("invalid TOML syntax".to_owned());
        let display_str = format!("{}", err);
        assert!(display_str.contains("configuration error"));
        assert!(display_str.contains("invalid TOML syntax"));
    }
}
