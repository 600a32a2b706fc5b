use std::time::Duration;

use hyper::StatusCode;
use thiserror::Error;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal proxy error";

/// Every way a relay request can end without relaying the upstream body.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing \"url\" query parameter")]
    MissingUrl,

    #[error("Invalid \"url\" query parameter")]
    InvalidUrl(#[source] Option<url::ParseError>),

    #[error("Only http/https allowed")]
    SchemeNotAllowed,

    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    #[error("Upstream error {}", .0.as_u16())]
    Upstream(StatusCode),

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    #[error("upstream request failed")]
    Fetch(#[source] reqwest::Error),
}

pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl(_) | ProxyError::SchemeNotAllowed => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::DomainNotAllowed(_) => StatusCode::FORBIDDEN,
            ProxyError::Upstream(status) => *status,
            ProxyError::Timeout(_) | ProxyError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text body shown to the caller. Internal failures never leak
    /// their cause.
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ProxyError::Timeout(_) | ProxyError::Fetch(_))
    }
}
