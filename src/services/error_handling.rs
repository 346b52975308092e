use crate::domain::layout::GeometryError;
use anyhow::Context;
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Why a single raw record was dropped from a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationError {
    #[error("Record {index} is not a recognizable trend")]
    UnrecognizedShape { index: usize },

    #[error("Record {index} has an invalid {field}: expected text")]
    InvalidField { index: usize, field: &'static str },

    #[error("Record {index} is missing required field {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("Record {index} has an unknown {field} value: {value}")]
    UnknownValue {
        index: usize,
        field: &'static str,
        value: String,
    },
}

/// Terminal failure of one generation request. There are no partial results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("No API key configured")]
    MissingCredential,

    #[error("API key was rejected")]
    InvalidCredential,

    #[error("API key lacks permission for this request")]
    Forbidden,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Trend service unavailable (status {status})")]
    UpstreamUnavailable { status: u16 },

    #[error("Trend service rejected the request (status {status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Malformed response: {reason}")]
    MalformedPayload { reason: String },

    #[error("No usable trends in response ({received} records received)")]
    EmptyBatch { received: usize },

    #[error("Network error: {message}")]
    Network { message: String },
}

impl GenerationError {
    /// The user should be asked for a different key before trying again.
    pub fn needs_new_credential(&self) -> bool {
        matches!(
            self,
            GenerationError::MissingCredential | GenerationError::InvalidCredential | GenerationError::Forbidden
        )
    }

    /// Reissuing the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited
                | GenerationError::UpstreamUnavailable { .. }
                | GenerationError::MalformedPayload { .. }
                | GenerationError::Network { .. }
        )
    }
}

/// Top-level error for radar operations.
#[derive(Error, Debug)]
pub enum RadarError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Search not found: {id}")]
    SearchNotFound { id: Uuid },

    #[error(transparent)]
    InvalidGeometry(#[from] GeometryError),

    #[error("Store operation failed: {operation}")]
    Store {
        operation: String,
        #[source]
        source: anyhow::Error,
    },
}

impl RadarError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RadarError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error context wrapper for store calls
pub struct ErrorContext {
    operation: String,
    details: Vec<(String, String)>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.details.push((key.into(), value.to_string()));
        self
    }

    /// Convert a store failure into [`RadarError::Store`], keeping the
    /// details in the error chain.
    pub fn wrap<T>(self, result: anyhow::Result<T>) -> Result<T, RadarError> {
        let operation = self.operation.clone();
        result
            .with_context(|| {
                let mut msg = format!("Operation '{}' failed", self.operation);
                if !self.details.is_empty() {
                    msg.push_str(" with context:");
                    for (key, value) in &self.details {
                        msg.push_str(&format!("\n  {}: {}", key, value));
                    }
                }
                msg
            })
            .map_err(|source| RadarError::Store { operation, source })
    }
}

/// Structured logging helpers
pub struct LogHelper;

impl LogHelper {
    #[instrument(skip(error))]
    pub fn log_generation_failure(domain: &str, error: &GenerationError) {
        if error.needs_new_credential() {
            warn!(
                domain = %domain,
                error = %error,
                "Trend generation refused: credential problem"
            );
        } else {
            error!(
                domain = %domain,
                error = %error,
                retryable = error.is_retryable(),
                "Trend generation failed"
            );
        }
    }

    pub fn log_generation_success(domain: &str, count: usize) {
        info!(domain = %domain, count = count, "Trend generation completed");
    }

    pub fn log_normalization_skip(error: &NormalizationError) {
        warn!(error = %error, "Skipping trend record");
    }

    /// Log a CLI command that failed outside the typed radar errors, such as
    /// a bad flag value or an unwritable config file.
    pub fn log_command_failure(command: &str, error: &anyhow::Error) {
        error!(
            command = %command,
            error = %error,
            causes = ?error_chain(error),
            "Command failed"
        );
    }

    pub fn log_performance_warning(operation: &str, duration_ms: u64, threshold_ms: u64) {
        if duration_ms > threshold_ms {
            warn!(
                operation = %operation,
                duration_ms = duration_ms,
                threshold_ms = threshold_ms,
                "Operation exceeded performance threshold"
            );
        }
    }
}

/// Every message in an anyhow chain, outermost first.
pub fn error_chain(error: &anyhow::Error) -> Vec<String> {
    error.chain().map(|cause| cause.to_string()).collect()
}

/// User-friendly error messages
pub struct UserErrorFormatter;

impl UserErrorFormatter {
    pub fn format_for_ui(error: &RadarError) -> String {
        match error {
            RadarError::Generation(e) => Self::format_generation_error(e),
            RadarError::Validation { field, reason } => format!("Invalid {}: {}", field, reason),
            RadarError::SearchNotFound { .. } => {
                "That search could not be found. It may have been deleted.".to_string()
            }
            RadarError::InvalidGeometry(e) => format!("Cannot draw the radar: {}", e),
            RadarError::Store { .. } => {
                "Failed to save or load search history. Please try again.".to_string()
            }
        }
    }

    pub fn format_generation_error(error: &GenerationError) -> String {
        match error {
            GenerationError::MissingCredential => {
                "Please configure your Perplexity API key in settings.".to_string()
            }
            GenerationError::InvalidCredential => {
                "Invalid API key. Please check your Perplexity API key in settings.".to_string()
            }
            GenerationError::Forbidden => {
                "Access forbidden. Please verify your API key has proper permissions.".to_string()
            }
            GenerationError::RateLimited => {
                "Rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            GenerationError::UpstreamUnavailable { .. } => {
                "Perplexity API is experiencing issues. Please try again in a few moments.".to_string()
            }
            GenerationError::UpstreamRejected { status, .. } => {
                format!("Request failed with status {}", status)
            }
            GenerationError::MalformedPayload { .. } => {
                "Failed to parse API response. The AI may have included extra text. Please try again."
                    .to_string()
            }
            GenerationError::EmptyBatch { received: 0 } => {
                "No trends found. Please try a different domain or search query.".to_string()
            }
            GenerationError::EmptyBatch { .. } => {
                "Failed to process trends data. Please try again.".to_string()
            }
            GenerationError::Network { .. } => {
                "Network error. Please check your connection and try again.".to_string()
            }
        }
    }
}

/// Performance monitoring
pub struct PerformanceMonitor {
    operation: String,
    start: Instant,
    threshold_ms: u64,
}

impl PerformanceMonitor {
    pub fn new(operation: impl Into<String>, threshold_ms: u64) -> Self {
        Self {
            operation: operation.into(),
            start: Instant::now(),
            threshold_ms,
        }
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        LogHelper::log_performance_warning(&self.operation, duration_ms, self.threshold_ms);

        debug!(
            operation = %self.operation,
            duration_ms = duration_ms,
            "Operation completed"
        );
    }
}
