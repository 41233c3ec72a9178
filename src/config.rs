use anyhow::{anyhow, Result};
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_RENDER_WIDTH: usize = 60;
const MIN_RENDER_WIDTH: usize = 20;
const MAX_RENDER_WIDTH: usize = 200;

pub const RUN_STRATEGY_PATH: &str = "run-strategy";
pub const LIST_RUNS_PATH: &str = "strategies";

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the strategy service; endpoint paths are joined onto it.
    pub api_base: Url,
    pub render_width: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let base = std::env::var("STRATEGY_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let width = std::env::var("RENDER_WIDTH").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_RENDER_WIDTH);
        Self::new(&base, width)
    }

    pub fn new(api_base: &str, render_width: usize) -> Result<Self> {
        Ok(Self {
            api_base: parse_base(api_base)?,
            render_width: render_width.clamp(MIN_RENDER_WIDTH, MAX_RENDER_WIDTH),
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Result<Self> {
        self.api_base = parse_base(api_base)?;
        Ok(self)
    }

    pub fn with_render_width(mut self, width: usize) -> Self {
        self.render_width = width.clamp(MIN_RENDER_WIDTH, MAX_RENDER_WIDTH);
        self
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.api_base.join(path).map_err(|source| ClientError::Endpoint {
            path: path.to_string(),
            source,
        })
    }

    pub fn run_strategy_url(&self) -> Result<Url, ClientError> {
        self.endpoint(RUN_STRATEGY_PATH)
    }

    pub fn list_runs_url(&self) -> Result<Url, ClientError> {
        self.endpoint(LIST_RUNS_PATH)
    }

    pub fn run_url(&self, id: u64) -> Result<Url, ClientError> {
        self.endpoint(&format!("strategy/{}", id))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: Url::parse(&format!("{}/", DEFAULT_API_BASE)).expect("default base is a valid url"),
            render_width: DEFAULT_RENDER_WIDTH,
        }
    }
}

/// Parses the service root and forces a trailing slash so `join` appends
/// instead of replacing the last path segment.
fn parse_base(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|e| anyhow!("invalid api base {:?}: {}", raw, e))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("api base must be an http(s) url, got {:?}", raw));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
