use super::types::DangleError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl DangleError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transient network and tool failures
            DangleError::Dns(_) => ErrorClassification {
                error_type: "DnsError",
                retryable: true,
            },
            DangleError::Http(_) => ErrorClassification {
                error_type: "HttpError",
                retryable: true,
            },
            DangleError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            DangleError::Tool(_) => ErrorClassification {
                error_type: "ToolError",
                retryable: true,
            },
            DangleError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: true,
            },

            // Non-retryable errors
            DangleError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            DangleError::InvalidTarget(_) => ErrorClassification {
                error_type: "InvalidTargetError",
                retryable: false,
            },
            DangleError::ToolUnavailable(_) => ErrorClassification {
                error_type: "ToolUnavailableError",
                retryable: false,
            },
            DangleError::PartialBatch { .. } => ErrorClassification {
                error_type: "PartialBatchError",
                retryable: false,
            },
            DangleError::Cancelled => ErrorClassification {
                error_type: "CancelledError",
                retryable: false,
            },
            DangleError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            DangleError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
            DangleError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }

    /// Configuration problems abort a scan before any phase runs.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DangleError::Config(_) | DangleError::InvalidTarget(_) | DangleError::Yaml(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_error_retryable() {
        let err = DangleError::Dns("SERVFAIL from 8.8.8.8".into());
        let class = err.classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "DnsError");
    }

    #[test]
    fn test_config_error_not_retryable() {
        let err = DangleError::Config("invalid config".into());
        let class = err.classify();
        assert!(!class.retryable);
        assert_eq!(class.error_type, "ConfigError");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_timeout_retryable() {
        let err = DangleError::Timeout("timed out".into());
        assert!(err.classify().retryable);
    }

    #[test]
    fn test_tool_failure_retryable_but_missing_tool_not() {
        assert!(DangleError::Tool("exit status 1".into()).classify().retryable);
        assert!(!DangleError::ToolUnavailable("subfinder".into()).classify().retryable);
    }

    #[test]
    fn test_partial_batch_not_retryable() {
        let err = DangleError::PartialBatch {
            phase: "dns-validate".into(),
            chunk: 1,
            reason: "resolver outage".into(),
        };
        assert!(!err.classify().retryable);
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Batch 1 failed during dns-validate: resolver outage");
    }

    #[test]
    fn test_cancelled_not_retryable() {
        assert!(!DangleError::Cancelled.classify().retryable);
    }
}
