//! Interactive terminal loop.
//!
//! Each input line is the prompt as typed. A submission and every history
//! command run on their own tasks; the loop selects over input and their
//! handles, so nothing the service does holds up typing or the others.
//! A line that arrives mid-request only updates the prompt. History output
//! is printed in the order the commands were given.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinHandle};

use crate::api::StrategyApi;
use crate::commands::{list_text, show_text};
use crate::error::ClientError;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::view::StrategyRunnerView;

type Pending = JoinHandle<Result<Value, ClientError>>;

pub const HELP: &str = "\
commands:
  <text>      set the prompt and run it
  /run        run the current prompt again
  /list       list runs stored by the service
  /show <id>  show one stored run
  /help       this text
  /quit       exit (waits for running requests)";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Prompt(String),
    Rerun,
    List,
    Show(u64),
    Help,
    Quit,
    Invalid(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return Command::Prompt(line.to_string());
    }
    let mut parts = trimmed.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("/run"), None) => Command::Rerun,
        (Some("/list"), None) => Command::List,
        (Some("/help"), None) => Command::Help,
        (Some("/quit") | Some("/exit"), None) => Command::Quit,
        (Some("/show"), Some(id)) => match id.parse() {
            Ok(id) => Command::Show(id),
            Err(_) => Command::Invalid(format!("not a run id: {}", id)),
        },
        _ => Command::Invalid(format!("unknown command: {}", trimmed)),
    }
}

pub struct App {
    api: Arc<dyn StrategyApi>,
    view: StrategyRunnerView,
    width: usize,
}

impl App {
    pub fn new(api: Arc<dyn StrategyApi>, width: usize) -> Self {
        Self {
            api,
            view: StrategyRunnerView::new(),
            width,
        }
    }

    pub fn view(&self) -> &StrategyRunnerView {
        &self.view
    }

    /// Runs until input ends (EOF or `/quit`) and every started task has
    /// been reported.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        log(Level::Info, Domain::System, "interactive_start", obj(&[]));
        let mut lines = input.lines();
        let mut input_open = true;
        let mut inflight: Option<Pending> = None;
        let mut history: VecDeque<JoinHandle<String>> = VecDeque::new();
        writeln!(out, "{}", HELP)?;
        self.draw(out)?;

        while input_open || inflight.is_some() || !history.is_empty() {
            tokio::select! {
                joined = wait_request(&mut inflight) => {
                    inflight = None;
                    self.view.settle(joined.unwrap_or_else(|e| Err(ClientError::task(e))));
                    self.draw(out)?;
                }
                text = wait_history(&mut history) => {
                    history.pop_front();
                    let text = text.unwrap_or_else(|e| format!("error: {}", ClientError::task(e)));
                    writeln!(out, "{}", text.trim_end())?;
                    out.flush()?;
                }
                line = lines.next_line(), if input_open => {
                    let Some(line) = line? else {
                        input_open = false;
                        continue;
                    };
                    match parse_command(&line) {
                        Command::Quit => input_open = false,
                        Command::Help => writeln!(out, "{}", HELP)?,
                        Command::Invalid(msg) => writeln!(out, "{}", msg)?,
                        Command::List => history.push_back(self.spawn_list()),
                        Command::Show(id) => history.push_back(self.spawn_show(id)),
                        Command::Rerun => self.start(&mut inflight, out)?,
                        Command::Prompt(text) => {
                            self.view.set_prompt(text);
                            self.start(&mut inflight, out)?;
                        }
                    }
                }
            }
        }

        log(Level::Info, Domain::System, "interactive_stop", obj(&[]));
        Ok(())
    }

    fn start<W: Write>(&mut self, inflight: &mut Option<Pending>, out: &mut W) -> Result<()> {
        match self.view.begin_submit() {
            Some(req) => {
                let api = Arc::clone(&self.api);
                *inflight = Some(tokio::spawn(async move { api.run_strategy(&req).await }));
            }
            None => writeln!(out, "busy: a request is running; prompt updated")?,
        }
        self.draw(out)
    }

    fn spawn_list(&self) -> JoinHandle<String> {
        log(Level::Debug, Domain::View, "history_start", obj(&[("command", v_str("list"))]));
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            list_text(api.as_ref())
                .await
                .unwrap_or_else(|err| format!("error: {}", err))
        })
    }

    fn spawn_show(&self, id: u64) -> JoinHandle<String> {
        log(Level::Debug, Domain::View, "history_start", obj(&[("command", v_str("show"))]));
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            show_text(api.as_ref(), id)
                .await
                .unwrap_or_else(|err| format!("error: {}", err))
        })
    }

    fn draw<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.view.render(self.width))?;
        out.flush()?;
        Ok(())
    }
}

/// Resolves with the in-flight outcome; never resolves when idle.
async fn wait_request(slot: &mut Option<Pending>) -> Result<Result<Value, ClientError>, JoinError> {
    match slot.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Resolves with the oldest history command's output; never when none run.
async fn wait_history(queue: &mut VecDeque<JoinHandle<String>>) -> Result<String, JoinError> {
    match queue.front_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
