use thiserror::Error;

/// Longest body excerpt carried in a decode error.
const SNIPPET_LEN: usize = 120;

/// Failures talking to the strategy service.
///
/// `submit` swallows `Transport` and `Decode` after logging them; the history
/// commands surface every variant to the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint {path:?}: {source}")]
    Endpoint {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} (status {status}) is not valid JSON ({source}); body starts with {snippet:?}")]
    Decode {
        url: String,
        status: u16,
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{url} answered {status}: {detail}")]
    Status {
        url: String,
        status: u16,
        detail: String,
    },

    #[error("request task ended without an answer: {reason}")]
    Task { reason: String },
}

impl ClientError {
    pub fn decode(url: &str, status: u16, body: &[u8], source: serde_json::Error) -> Self {
        let text = String::from_utf8_lossy(body);
        let snippet: String = text.chars().take(SNIPPET_LEN).collect();
        ClientError::Decode {
            url: url.to_string(),
            status,
            snippet,
            source,
        }
    }

    /// Task that carried the request died before answering.
    pub fn task(source: tokio::task::JoinError) -> Self {
        ClientError::Task {
            reason: source.to_string(),
        }
    }

    /// Short machine-readable tag used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Endpoint { .. } => "endpoint",
            ClientError::Transport { .. } => "transport",
            ClientError::Decode { .. } => "decode",
            ClientError::Status { .. } => "status",
            ClientError::Task { .. } => "task",
        }
    }
}
