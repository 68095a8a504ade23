//! Error types for adsync
//!
//! This module defines the error hierarchy for the whole connector.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! The retry layer keys off [`Error::classify`] to decide whether a failed
//! remote call is worth repeating.

use thiserror::Error;

/// The main error type for adsync
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Token refresh failed with HTTP {status}: {message}")]
    TokenRefresh { status: u16, message: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("TLS handshake failed: {message}")]
    Handshake { message: String },

    #[error("Request timed out during {operation}")]
    Timeout { operation: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Report Job Errors
    // ============================================================================
    #[error("No usable columns for report stream '{stream}'")]
    ReportColumns { stream: String },

    #[error("Report generation failed for '{report}'")]
    ReportGeneration { report: String },

    #[error("Report '{report}' did not finish after {attempts} poll attempts")]
    ReportPollTimeout { report: String, attempts: u32 },

    #[error("Report download for '{report}' returned HTTP {status}")]
    ReportDownload { report: String, status: u16 },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("CSV parsing error: {message}")]
    CsvParse { message: String },

    #[error("Report archive error: {message}")]
    Archive { message: String },

    #[error("Cannot resolve schema for remote type '{type_name}'")]
    SchemaResolution { type_name: String },

    // ============================================================================
    // Catalog / State Errors
    // ============================================================================
    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // I/O and Generic Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Failure class used by the retry layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Connection reset, refused, or other transport failure
    TransientNetwork,
    /// Remote returned a 5xx response
    TransientServer,
    /// Socket timeout, HTTP 408, or TLS handshake timeout
    TransientTimeout,
    /// Remote asked us to slow down (429)
    RateLimit,
    /// Malformed request, remote fault, or anything else not worth retrying
    Fatal,
}

impl ErrorClass {
    /// Whether this class should be retried with backoff
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Fatal)
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a handshake error
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a report generation error
    pub fn report_generation(report: impl Into<String>) -> Self {
        Self::ReportGeneration {
            report: report.into(),
        }
    }

    /// Create a CSV parse error
    pub fn csv(message: impl Into<String>) -> Self {
        Self::CsvParse {
            message: message.into(),
        }
    }

    /// Create an archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Classify this error for the retry layer
    ///
    /// A handshake failure only counts as transient when its message
    /// indicates a timeout; any other handshake failure is fatal on the
    /// first attempt.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Error::Http(e) => {
                if e.is_timeout() {
                    ErrorClass::TransientTimeout
                } else if e.is_connect() || e.is_request() {
                    let message = e.to_string();
                    if message.contains("handshake") {
                        if message_indicates_timeout(&message) {
                            ErrorClass::TransientTimeout
                        } else {
                            ErrorClass::Fatal
                        }
                    } else {
                        ErrorClass::TransientNetwork
                    }
                } else {
                    ErrorClass::TransientNetwork
                }
            }
            Error::HttpStatus { status, .. } => classify_status(*status),
            // A failed token exchange is as transient as its status says
            Error::TokenRefresh { status, .. } => classify_status(*status),
            Error::Handshake { message } => {
                if message_indicates_timeout(message) {
                    ErrorClass::TransientTimeout
                } else {
                    ErrorClass::Fatal
                }
            }
            Error::Timeout { .. } => ErrorClass::TransientTimeout,
            Error::RateLimited { .. } => ErrorClass::RateLimit,
            _ => ErrorClass::Fatal,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.classify().is_retryable()
    }
}

/// Map an HTTP status code to a failure class
fn classify_status(status: u16) -> ErrorClass {
    match status {
        408 => ErrorClass::TransientTimeout,
        429 => ErrorClass::RateLimit,
        500..=599 => ErrorClass::TransientServer,
        _ => ErrorClass::Fatal,
    }
}

fn message_indicates_timeout(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("timed out") || lower.contains("timeout")
}

/// Result type alias for adsync
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}
