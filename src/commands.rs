//! One-shot subcommands behind the binary.
//!
//! `run` follows the view contract: a failed submission is logged and the
//! command still succeeds with an empty frame. `list` and `show` report
//! service errors to the caller.

use std::io::Write;

use anyhow::Result;

use crate::api::StrategyApi;
use crate::error::ClientError;
use crate::model::{RunListing, StrategyResult};
use crate::render::{render_run_list, ResultPanel};
use crate::view::StrategyRunnerView;

/// Submits `prompt` once. Draws the loading frame and then the settled one,
/// or with `json` prints only the stored body.
pub async fn run<W: Write>(api: &dyn StrategyApi, prompt: &str, json: bool, width: usize, out: &mut W) -> Result<()> {
    let mut view = StrategyRunnerView::new();
    view.set_prompt(prompt);
    if json {
        view.submit(api, |_| {}).await;
        if let Some(result) = view.result() {
            writeln!(out, "{}", serde_json::to_string_pretty(result)?)?;
        }
        return Ok(());
    }

    let mut drawn = Ok(());
    view.submit(api, |v| drawn = writeln!(out, "{}", v.render(width))).await;
    drawn?;
    writeln!(out, "{}", view.render(width))?;
    Ok(())
}

pub async fn list<W: Write>(api: &dyn StrategyApi, out: &mut W) -> Result<()> {
    writeln!(out, "{}", list_text(api).await?)?;
    Ok(())
}

pub async fn show<W: Write>(api: &dyn StrategyApi, id: u64, out: &mut W) -> Result<()> {
    write!(out, "{}", show_text(api, id).await?)?;
    Ok(())
}

/// Stored runs as a table.
pub async fn list_text(api: &dyn StrategyApi) -> Result<String, ClientError> {
    let body = api.list_runs().await?;
    Ok(render_run_list(&RunListing::from_value(body)))
}

/// One stored run as a result panel.
pub async fn show_text(api: &dyn StrategyApi, id: u64) -> Result<String, ClientError> {
    let body = api.get_run(id).await?;
    Ok(match StrategyResult::from_value(body) {
        Some(run) => ResultPanel::from_result(&run).to_string(),
        None => format!("run {} has no content\n", id),
    })
}
