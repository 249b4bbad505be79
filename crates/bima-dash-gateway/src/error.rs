// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayErrorCode {
    /// Connection, DNS, TLS or timeout failure.
    Transport,
    /// Upstream answered with a non-2xx status. The body is not read.
    Status,
    /// Upstream body was not the expected JSON.
    Decode,
    /// Request could not be built from the configured values.
    Config,
}

impl GatewayErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "upstream_unavailable",
            Self::Status => "upstream_status",
            Self::Decode => "upstream_decode",
            Self::Config => "config_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    pub status: Option<u16>,
}

impl GatewayError {
    #[must_use]
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn status(status: u16, url: &str) -> Self {
        Self {
            code: GatewayErrorCode::Status,
            message: format!("upstream returned status {status} for {url}"),
            status: Some(status),
        }
    }

    #[must_use]
    pub fn transport(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connect failed"
        } else {
            "request failed"
        };
        Self::new(GatewayErrorCode::Transport, format!("{kind}: {err}"))
    }

    #[must_use]
    pub fn decode(err: impl Display) -> Self {
        Self::new(GatewayErrorCode::Decode, format!("invalid upstream payload: {err}"))
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for GatewayError {}
