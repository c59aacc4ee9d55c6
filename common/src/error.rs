use thiserror::Error;

/// The only failure kind that crosses the device client boundary. Transport
/// faults (timeout, DNS, refused connection) all fold into `Unreachable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("device unreachable: {0}")]
    Unreachable(String),
    #[error("HTTP {code}: {detail}")]
    HttpStatus { code: u16, detail: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    Unreachable,
    HttpStatus,
    MalformedResponse,
}

impl DeviceError {
    pub fn kind(&self) -> DeviceErrorKind {
        match self {
            Self::Unreachable(_) => DeviceErrorKind::Unreachable,
            Self::HttpStatus { .. } => DeviceErrorKind::HttpStatus,
            Self::MalformedResponse(_) => DeviceErrorKind::MalformedResponse,
        }
    }

    pub fn diagnostic(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("DISCORD_TOKEN is not set")]
    MissingToken,
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_diagnostic_includes_code_and_body() {
        let err = DeviceError::HttpStatus {
            code: 503,
            detail: "busy".to_string(),
        };

        assert_eq!(err.kind(), DeviceErrorKind::HttpStatus);
        assert_eq!(err.diagnostic(), "HTTP 503: busy");
    }
}
