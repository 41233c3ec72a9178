use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

mod http;

pub use http::HttpStrategyApi;

/// Body of `POST /run-strategy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub prompt: String,
}

/// The strategy service, seen from the client.
///
/// Bodies come back as untyped JSON; shaping them is the caller's business.
#[async_trait]
pub trait StrategyApi: Send + Sync {
    /// Status codes are not inspected: any parseable body is returned.
    async fn run_strategy(&self, req: &RunRequest) -> Result<Value, ClientError>;

    /// Non-2xx statuses are reported as [`ClientError::Status`].
    async fn list_runs(&self) -> Result<Value, ClientError>;

    async fn get_run(&self, id: u64) -> Result<Value, ClientError>;
}
