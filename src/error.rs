use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    ConfigError(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    ForbiddenTarget(String),
    #[error("OpenAI API Error: {}", status_line(.status))]
    UpstreamStatus { status: u16, body: String },
    #[error("Failed to fetch image")]
    ProxyUpstreamStatus(u16),
    #[error("{0}")]
    MalformedResponse(String),
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    RequestError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

fn status_line(status: &u16) -> String {
    match reqwest::StatusCode::from_u16(*status)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("{} {}", status, reason),
        None => status.to_string(),
    }
}

impl RelayError {
    /// Classify a reqwest failure, keeping timeouts apart from other transport errors.
    pub fn from_transport(context: &str, err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = std::error::Error::source(cause);
        }

        if err.is_timeout() {
            RelayError::Timeout(format!("{} timed out: {}", context, message))
        } else {
            RelayError::RequestError(format!("{}: {}", context, message))
        }
    }

    /// Faults the caller did not cause and could not have avoided.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            RelayError::Timeout(_)
                | RelayError::RequestError(_)
                | RelayError::SerializationError(_)
                | RelayError::InternalError(_)
        )
    }

    pub fn http_status(&self) -> u16 {
        match self {
            RelayError::InvalidInput(_) => 400,
            RelayError::ForbiddenTarget(_) => 403,
            RelayError::ProxyUpstreamStatus(code) => *code,
            RelayError::Timeout(_) => 504,
            RelayError::ConfigError(_)
            | RelayError::UpstreamStatus { .. }
            | RelayError::MalformedResponse(_)
            | RelayError::RequestError(_)
            | RelayError::SerializationError(_)
            | RelayError::InternalError(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let mut body = ErrorBody::new(self.to_string());
        match self {
            RelayError::UpstreamStatus { body: upstream, .. } => {
                body.details = Some(upstream.clone());
                body.timestamp = Some(Utc::now().to_rfc3339());
            }
            err if err.is_unexpected() => {
                body.details = Some(format!("{:?}", err));
                body.timestamp = Some(Utc::now().to_rfc3339());
            }
            _ => {}
        }
        body
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::InternalError(err.to_string())
    }
}

/// JSON error payload returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            timestamp: None,
        }
    }
}

#[cfg(feature = "server")]
impl actix_web::ResponseError for RelayError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(self.http_status())
            .unwrap_or(actix_web::http::StatusCode::BAD_GATEWAY)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(self.status_code()).json(self.to_body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_keeps_code_and_body() {
        let err = RelayError::UpstreamStatus {
            status: 401,
            body: "{\"error\":\"bad key\"}".to_string(),
        };
        assert_eq!(err.http_status(), 500);

        let body = err.to_body();
        assert_eq!(body.error, "OpenAI API Error: 401 Unauthorized");
        assert_eq!(body.details.as_deref(), Some("{\"error\":\"bad key\"}"));
        assert!(body.timestamp.is_some());
    }

    #[test]
    fn user_errors_have_no_diagnostics() {
        let body = RelayError::InvalidInput("Prompt is required".into()).to_body();
        assert_eq!(body, ErrorBody::new("Prompt is required"));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(RelayError::Timeout("x".into()).http_status(), 504);
        assert_eq!(RelayError::ForbiddenTarget("x".into()).http_status(), 403);
        assert_eq!(RelayError::ProxyUpstreamStatus(404).http_status(), 404);
        assert_eq!(RelayError::ConfigError("x".into()).http_status(), 500);
    }

    #[test]
    fn unexpected_errors_carry_timestamp() {
        let body = RelayError::RequestError("Image edit failed: boom".into()).to_body();
        assert_eq!(body.error, "Image edit failed: boom");
        assert!(body.details.unwrap().contains("RequestError"));
        assert!(body.timestamp.is_some());
    }
}
