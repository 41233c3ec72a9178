//! Read-only views over the service's JSON.
//!
//! Bodies are kept exactly as received. Accessors walk the expected nested
//! shape and fall back to empty text or `n/a`; nothing here rejects a body.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A parsed `/run-strategy` (or stored run) body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StrategyResult {
    raw: Value,
}

impl StrategyResult {
    /// `null` counts as no result, same as an absent one.
    pub fn from_value(raw: Value) -> Option<Self> {
        if raw.is_null() {
            None
        } else {
            Some(Self { raw })
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    fn at(&self, section: &str, field: &str) -> Option<&Value> {
        self.raw.get(section).and_then(|s| s.get(field))
    }

    pub fn strategy_name(&self) -> String {
        text_of(self.at("strategy", "strategy_name"))
    }

    pub fn description(&self) -> String {
        text_of(self.at("strategy", "description"))
    }

    pub fn sharpe_ratio(&self) -> MetricValue {
        MetricValue::from(self.at("results", "sharpe_ratio"))
    }

    pub fn win_rate(&self) -> MetricValue {
        MetricValue::from(self.at("results", "win_rate"))
    }

    pub fn average_return(&self) -> MetricValue {
        MetricValue::from(self.at("results", "average_return"))
    }

    pub fn explanation(&self) -> String {
        text_of(self.raw.get("explanation"))
    }

    /// Ticker the strategy trades. The backtest echoes it under `results`
    /// too, which older runs may carry alone.
    pub fn symbol(&self) -> String {
        text_of(self.at("strategy", "symbol").or_else(|| self.at("results", "symbol")))
    }

    pub fn timeframe(&self) -> String {
        text_of(self.at("strategy", "timeframe"))
    }

    /// `strategy.indicators[].name`. Bare strings are taken as names.
    pub fn indicator_names(&self) -> Vec<String> {
        let Some(Value::Array(items)) = self.at("strategy", "indicators") else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => text_of(other.get("name")),
            })
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Run number assigned by the service, when it reports one.
    pub fn id(&self) -> Option<u64> {
        self.raw.get("id").and_then(Value::as_u64)
    }

    /// Backtest metrics beyond the headline three, in display order.
    /// Only those present in the body are returned.
    pub fn extended_metrics(&self) -> Vec<(&'static str, MetricValue)> {
        const EXTENDED: [(&str, &str); 5] = [
            ("hit_ratio", "Hit Ratio"),
            ("sortino_ratio", "Sortino"),
            ("max_drawdown", "Max DD"),
            ("cagr", "CAGR"),
            ("total_trades", "Trades"),
        ];
        EXTENDED
            .iter()
            .filter_map(|(key, label)| {
                self.at("results", key).map(|v| (*label, MetricValue::from(Some(v))))
            })
            .collect()
    }
}

/// Strings verbatim; anything else as compact JSON; missing as empty.
fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// An opaque metric, displayed exactly as the service sent it.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Missing,
    Number(serde_json::Number),
    Text(String),
    Other(Value),
}

impl From<Option<&Value>> for MetricValue {
    fn from(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => MetricValue::Missing,
            Some(Value::Number(n)) => MetricValue::Number(n.clone()),
            Some(Value::String(s)) => MetricValue::Text(s.clone()),
            Some(other) => MetricValue::Other(other.clone()),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Missing => f.write_str("n/a"),
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => f.write_str(s),
            MetricValue::Other(v) => write!(f, "{}", v),
        }
    }
}

/// The `GET /strategies` body.
#[derive(Debug, Clone, Default)]
pub struct RunListing {
    pub runs: Vec<StrategyResult>,
}

impl RunListing {
    /// Accepts a JSON array; any other shape is treated as an empty listing.
    pub fn from_value(raw: Value) -> Self {
        let runs = match raw {
            Value::Array(items) => items.into_iter().filter_map(StrategyResult::from_value).collect(),
            _ => Vec::new(),
        };
        Self { runs }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
