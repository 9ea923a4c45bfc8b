//! Gateway error type

use thiserror::Error;

/// Broad classification of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Connection refused, reset, DNS failure
    Transport,
    /// The configured request timeout elapsed
    Timeout,
    /// Non-2xx HTTP status
    Http,
    /// Body was not the JSON we expected
    Decode,
    /// The envelope carried a non-zero `result`
    Protocol,
}

/// A failed remote call. `url` is always the redacted form.
#[derive(Debug, Clone, Error)]
#[error("{code}; message: {message} (url: {url})")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub url: String,
    pub code: i64,
    pub message: String,
}

impl GatewayError {
    pub fn transport(url: String, message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::Transport,
            url,
            code: -1,
            message: message.into(),
        }
    }

    pub fn timeout(url: String) -> Self {
        Self {
            kind: GatewayErrorKind::Timeout,
            url,
            code: -1,
            message: "request timed out".to_string(),
        }
    }

    pub fn http(url: String, status: u16) -> Self {
        Self {
            kind: GatewayErrorKind::Http,
            url,
            code: i64::from(status),
            message: "http request failed".to_string(),
        }
    }

    pub fn decode(url: String) -> Self {
        Self {
            kind: GatewayErrorKind::Decode,
            url,
            code: -1,
            message: "invalid response from endpoint".to_string(),
        }
    }

    pub fn protocol(url: String, code: i64, message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::Protocol,
            url,
            code,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == GatewayErrorKind::Timeout
    }
}
