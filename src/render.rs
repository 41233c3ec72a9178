//! Frames: what the runner view looks like at one instant.
//!
//! A [`Frame`] is plain data so it can be asserted on directly; its
//! `Display` impl draws it for the terminal.

use std::fmt;

use crate::model::{RunListing, StrategyResult};

pub const RUN_LABEL: &str = "Run Strategy";
pub const RUNNING_LABEL: &str = "Running...";
pub const PROMPT_HINT: &str = "Describe a trading strategy";

/// Relative widths of the loading placeholder bars.
pub const SKELETON_BARS: [f32; 4] = [0.75, 0.5, 1.0, 0.66];

const BAR_CHAR: char = '░';
const RULE_CHAR: char = '─';

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub prompt: String,
    pub submit: SubmitControl,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub label: &'static str,
    pub enabled: bool,
}

impl SubmitControl {
    pub fn for_loading(loading: bool) -> Self {
        Self {
            label: if loading { RUNNING_LABEL } else { RUN_LABEL },
            enabled: !loading,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    /// Bar lengths in columns.
    Skeleton(Vec<usize>),
    Result(ResultPanel),
}

impl Body {
    pub fn skeleton(width: usize) -> Self {
        Body::Skeleton(
            SKELETON_BARS
                .iter()
                .map(|frac| ((width as f32) * frac).round().max(1.0) as usize)
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultPanel {
    pub run_id: Option<u64>,
    pub title: String,
    pub subtitle: String,
    /// Symbol, timeframe and indicators, whichever the body carries.
    pub details: Option<String>,
    pub metrics: String,
    pub extended: Option<String>,
    pub explanation: Vec<String>,
}

impl ResultPanel {
    pub fn from_result(result: &StrategyResult) -> Self {
        let metrics = format!(
            "Sharpe: {} | Win Rate: {} | Avg Return: {}",
            result.sharpe_ratio(),
            result.win_rate(),
            result.average_return()
        );
        let extended = result.extended_metrics();
        let extended = if extended.is_empty() {
            None
        } else {
            Some(
                extended
                    .iter()
                    .map(|(label, v)| format!("{}: {}", label, v))
                    .collect::<Vec<_>>()
                    .join(" | "),
            )
        };
        let mut details = Vec::new();
        let symbol = result.symbol();
        if !symbol.is_empty() {
            details.push(format!("Symbol: {}", symbol));
        }
        let timeframe = result.timeframe();
        if !timeframe.is_empty() {
            details.push(format!("Timeframe: {}", timeframe));
        }
        let indicators = result.indicator_names();
        if !indicators.is_empty() {
            details.push(format!("Indicators: {}", indicators.join(", ")));
        }
        let details = if details.is_empty() { None } else { Some(details.join(" | ")) };
        let explanation = result.explanation();
        let explanation = if explanation.is_empty() {
            Vec::new()
        } else {
            explanation.lines().map(str::to_string).collect()
        };
        Self {
            run_id: result.id(),
            title: result.strategy_name(),
            subtitle: result.description(),
            details,
            metrics,
            extended,
            explanation,
        }
    }
}

impl fmt::Display for ResultPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.run_id {
            Some(id) => writeln!(f, "{}  [Run #{}]", self.title, id)?,
            None => writeln!(f, "{}", self.title)?,
        }
        writeln!(f, "{}", self.subtitle)?;
        if let Some(details) = &self.details {
            writeln!(f, "{}", details)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.metrics)?;
        if let Some(ext) = &self.extended {
            writeln!(f, "{}", ext)?;
        }
        if !self.explanation.is_empty() {
            writeln!(f)?;
            for line in &self.explanation {
                writeln!(f, "  {}", line)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule: String = std::iter::repeat(RULE_CHAR).take(self.width).collect();
        writeln!(f, "{}", rule)?;
        if self.prompt.is_empty() {
            writeln!(f, "> ({})", PROMPT_HINT)?;
        } else {
            writeln!(f, "> {}", self.prompt)?;
        }
        let state = if self.submit.enabled { "" } else { " (disabled)" };
        writeln!(f, "[ {} ]{}", self.submit.label, state)?;
        match &self.body {
            Body::Empty => {}
            Body::Skeleton(bars) => {
                writeln!(f)?;
                for len in bars {
                    let bar: String = std::iter::repeat(BAR_CHAR).take(*len).collect();
                    writeln!(f, "{}", bar)?;
                }
            }
            Body::Result(panel) => {
                writeln!(f)?;
                write!(f, "{}", panel)?;
            }
        }
        write!(f, "{}", rule)
    }
}

/// Compact table for `GET /strategies`.
pub fn render_run_list(listing: &RunListing) -> String {
    if listing.is_empty() {
        return "no runs recorded".to_string();
    }
    let mut out = format!("{:>4}  {:<28} {:>8} {:>9} {:>11}\n", "ID", "STRATEGY", "SHARPE", "WIN RATE", "AVG RETURN");
    for run in &listing.runs {
        let id = run.id().map(|i| i.to_string()).unwrap_or_else(|| "-".to_string());
        let name: String = run.strategy_name().chars().take(28).collect();
        out.push_str(&format!(
            "{:>4}  {:<28} {:>8} {:>9} {:>11}\n",
            id,
            name,
            run.sharpe_ratio().to_string(),
            run.win_rate().to_string(),
            run.average_return().to_string()
        ));
    }
    out.pop();
    out
}
