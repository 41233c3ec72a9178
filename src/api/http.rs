use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use crate::api::{RunRequest, StrategyApi};
use crate::config::Config;
use crate::error::ClientError;
use crate::logging::{log_request_start, log_response, v_str, ProfileScope};

/// reqwest-backed client. No timeout is configured: a request runs until the
/// service answers or the connection fails.
pub struct HttpStrategyApi {
    client: Client,
    cfg: Config,
}

impl HttpStrategyApi {
    pub fn new(cfg: Config) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Reads the whole body and parses it, whatever the status.
    async fn read_json(method: &str, url: &Url, resp: Response, checked: bool) -> Result<(u16, Value), ClientError> {
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;
        log_response(method, url.as_str(), status, body.len(), checked);
        let value = serde_json::from_slice(&body).map_err(|e| ClientError::decode(url.as_str(), status, &body, e))?;
        Ok((status, value))
    }

    async fn get_checked(&self, url: Url) -> Result<Value, ClientError> {
        let _profile = ProfileScope::with_context("get", &[("url", v_str(url.as_str()))]);
        log_request_start("GET", url.as_str(), None);
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;
        let (status, value) = Self::read_json("GET", &url, resp, true).await?;
        if !(200..300).contains(&status) {
            return Err(ClientError::Status {
                url: url.to_string(),
                status,
                detail: status_detail(&value),
            });
        }
        Ok(value)
    }
}

/// The service reports errors as `{"detail": "..."}`.
fn status_detail(body: &Value) -> String {
    match body.get("detail") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}

#[async_trait]
impl StrategyApi for HttpStrategyApi {
    async fn run_strategy(&self, req: &RunRequest) -> Result<Value, ClientError> {
        let url = self.cfg.run_strategy_url()?;
        let _profile = ProfileScope::with_context("run_strategy", &[("url", v_str(url.as_str()))]);
        log_request_start("POST", url.as_str(), Some(&req.prompt));
        // `.json` sets Content-Type: application/json
        let resp = self
            .client
            .post(url.clone())
            .json(req)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;
        let (_status, value) = Self::read_json("POST", &url, resp, false).await?;
        Ok(value)
    }

    async fn list_runs(&self) -> Result<Value, ClientError> {
        let url = self.cfg.list_runs_url()?;
        self.get_checked(url).await
    }

    async fn get_run(&self, id: u64) -> Result<Value, ClientError> {
        let url = self.cfg.run_url(id)?;
        self.get_checked(url).await
    }
}
