use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Transport failure or non-success HTTP status.
    #[error("Network error: {message}")]
    Network {
        status: Option<u16>,
        body: Option<String>,
        message: String,
    },

    /// Every write candidate answered with a "not supported" status.
    #[error("No write endpoint available (tried: {})", .tried.join(", "))]
    NoEndpointAvailable { tried: Vec<String> },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    /// Builds a [`RepositoryError::Network`] for a non-success response.
    pub fn http(status: u16, body: Option<String>) -> Self {
        let message = match body.as_deref() {
            Some(body) => format!("HTTP {status}: {}", truncate(body)),
            None => format!("HTTP {status}"),
        };
        RepositoryError::Network {
            status: Some(status),
            body,
            message,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RepositoryError::Network { status, .. } => *status,
            _ => None,
        }
    }
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    let body = body.trim();
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        RepositoryError::Network {
            status: err.status().map(|s| s.as_u16()),
            body: None,
            message,
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Parse(err.to_string())
    }
}
