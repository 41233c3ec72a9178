//! The strategy runner view model.
//!
//! Holds the three pieces of state the screen is drawn from and runs the
//! submit lifecycle. At most one request is in flight: `begin_submit` refuses
//! while `loading` is set, which is what the disabled submit control shows.

use serde_json::Value;

use crate::api::{RunRequest, StrategyApi};
use crate::error::ClientError;
use crate::logging::{log_request_failed, log_result_stored, log_submit_ignored};
use crate::model::StrategyResult;
use crate::render::{Body, Frame, ResultPanel, SubmitControl};

#[derive(Debug, Clone, Default)]
pub struct StrategyRunnerView {
    prompt: String,
    loading: bool,
    result: Option<StrategyResult>,
    /// Prompt of the request in flight, kept for the failure diagnostic.
    inflight_prompt: Option<String>,
}

impl StrategyRunnerView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&StrategyResult> {
        self.result.as_ref()
    }

    /// Input binding: replaces the prompt verbatim. Allowed while loading.
    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt = text.into();
    }

    /// Starts a run: sets `loading`, clears the previous result and returns
    /// the request to send. `None` while a request is already in flight.
    pub fn begin_submit(&mut self) -> Option<RunRequest> {
        if self.loading {
            log_submit_ignored("request in flight");
            return None;
        }
        self.loading = true;
        self.result = None;
        self.inflight_prompt = Some(self.prompt.clone());
        Some(RunRequest {
            prompt: self.prompt.clone(),
        })
    }

    /// Finishes a run. A parsed body becomes the result as-is; a failure is
    /// logged once and leaves the result absent. `loading` is always cleared.
    pub fn settle(&mut self, outcome: Result<Value, ClientError>) -> bool {
        let prompt = self.inflight_prompt.take().unwrap_or_default();
        let stored = match outcome {
            Ok(body) => {
                self.result = StrategyResult::from_value(body);
                if let Some(r) = &self.result {
                    log_result_stored(r.id(), &r.strategy_name());
                }
                self.result.is_some()
            }
            Err(err) => {
                log_request_failed(err.kind(), &err.to_string(), &prompt);
                self.result = None;
                false
            }
        };
        self.loading = false;
        stored
    }

    /// One full submission. `redraw` sees the view right after the run
    /// starts, before the service answers. Returns whether a result was stored.
    pub async fn submit<A, F>(&mut self, api: &A, mut redraw: F) -> bool
    where
        A: StrategyApi + ?Sized,
        F: FnMut(&Self),
    {
        let Some(req) = self.begin_submit() else {
            return false;
        };
        redraw(self);
        let outcome = api.run_strategy(&req).await;
        self.settle(outcome)
    }

    /// Pure function of the current state.
    pub fn render(&self, width: usize) -> Frame {
        let body = if self.loading {
            Body::skeleton(width)
        } else {
            match &self.result {
                Some(r) => Body::Result(ResultPanel::from_result(r)),
                None => Body::Empty,
            }
        };
        Frame {
            width,
            prompt: self.prompt.clone(),
            submit: SubmitControl::for_loading(self.loading),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture;
    use crate::render::{RUNNING_LABEL, RUN_LABEL};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers `run_strategy` from a queue of canned outcomes.
    struct ScriptedApi {
        outcomes: Mutex<Vec<Result<Value, ClientError>>>,
        seen: Mutex<Vec<RunRequest>>,
    }

    impl ScriptedApi {
        fn new(mut outcomes: Vec<Result<Value, ClientError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StrategyApi for ScriptedApi {
        async fn run_strategy(&self, req: &RunRequest) -> Result<Value, ClientError> {
            self.seen.lock().unwrap().push(req.clone());
            self.outcomes.lock().unwrap().pop().expect("unexpected request")
        }

        async fn list_runs(&self) -> Result<Value, ClientError> {
            Ok(json!([]))
        }

        async fn get_run(&self, _id: u64) -> Result<Value, ClientError> {
            Ok(Value::Null)
        }
    }

    fn momentum() -> Value {
        json!({
            "strategy": {"strategy_name": "Momentum", "description": "Buys winners"},
            "results": {"sharpe_ratio": 1.2, "win_rate": 0.55, "average_return": 0.03},
            "explanation": "Line1\nLine2"
        })
    }

    fn decode_error() -> ClientError {
        let err = serde_json::from_str::<Value>("<html>oops</html>").unwrap_err();
        ClientError::decode("http://svc/run-strategy", 500, b"<html>oops</html>", err)
    }

    #[test]
    fn test_initial_render() {
        let view = StrategyRunnerView::new();
        let frame = view.render(60);
        assert_eq!(frame.prompt, "");
        assert!(frame.submit.enabled);
        assert_eq!(frame.submit.label, RUN_LABEL);
        assert_eq!(frame.body, Body::Empty);
    }

    #[test]
    fn test_prompt_is_bound_verbatim() {
        let mut view = StrategyRunnerView::new();
        view.set_prompt("  RSI < 30 on AAPL\tthen sell > 70  ");
        assert_eq!(view.render(60).prompt, "  RSI < 30 on AAPL\tthen sell > 70  ");
    }

    #[tokio::test]
    async fn test_loading_shown_before_response() {
        let api = ScriptedApi::new(vec![Ok(momentum())]);
        let mut view = StrategyRunnerView::new();
        view.set_prompt("momentum");
        let mut seen_loading = None;
        view.submit(&api, |v| seen_loading = Some(v.render(60))).await;
        let frame = seen_loading.expect("redraw called");
        assert!(!frame.submit.enabled);
        assert_eq!(frame.submit.label, RUNNING_LABEL);
        assert!(matches!(frame.body, Body::Skeleton(ref bars) if bars.len() == 4));
    }

    #[tokio::test]
    async fn test_successful_submit_shows_panel() {
        let api = ScriptedApi::new(vec![Ok(momentum())]);
        let mut view = StrategyRunnerView::new();
        view.set_prompt("momentum");
        assert!(view.submit(&api, |_| {}).await);
        assert_eq!(api.seen.lock().unwrap()[0].prompt, "momentum");

        let frame = view.render(60);
        assert!(frame.submit.enabled);
        let Body::Result(panel) = frame.body else { panic!("expected result panel") };
        assert_eq!(panel.title, "Momentum");
        assert_eq!(panel.subtitle, "Buys winners");
        for needle in ["1.2", "0.55", "0.03"] {
            assert!(panel.metrics.contains(needle));
        }
        assert_eq!(panel.explanation, vec!["Line1", "Line2"]);
    }

    #[tokio::test]
    async fn test_failure_logs_once_and_leaves_empty() {
        let api = ScriptedApi::new(vec![Err(decode_error())]);
        let mut view = StrategyRunnerView::new();
        let cap = capture();
        assert!(!view.submit(&api, |_| {}).await);
        let records = cap.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["event"], "request_failed");
        assert!(!view.is_loading());
        assert!(view.result().is_none());
        assert_eq!(view.render(60).body, Body::Empty);
    }

    #[tokio::test]
    async fn test_second_submit_clears_previous_result() {
        let api = ScriptedApi::new(vec![Ok(momentum()), Err(decode_error())]);
        let mut view = StrategyRunnerView::new();
        view.set_prompt("same");
        assert!(view.submit(&api, |_| {}).await);
        let mut cleared = false;
        view.submit(&api, |v| cleared = v.result().is_none() && v.is_loading()).await;
        assert!(cleared);
        assert!(view.result().is_none());
        let seen = api.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn test_begin_submit_refused_while_loading() {
        let mut view = StrategyRunnerView::new();
        assert!(view.begin_submit().is_some());
        view.set_prompt("typed while waiting");
        assert!(view.begin_submit().is_none());
        assert_eq!(view.prompt(), "typed while waiting");
        view.settle(Ok(json!({"strategy": {"strategy_name": "X"}})));
        assert!(!view.is_loading());
        assert_eq!(view.result().unwrap().strategy_name(), "X");
    }

    #[test]
    fn test_empty_prompt_is_submittable() {
        let mut view = StrategyRunnerView::new();
        assert_eq!(view.begin_submit(), Some(RunRequest { prompt: String::new() }));
    }

    #[test]
    fn test_null_body_renders_nothing() {
        let mut view = StrategyRunnerView::new();
        view.begin_submit();
        assert!(!view.settle(Ok(Value::Null)));
        assert_eq!(view.render(60).body, Body::Empty);
    }
}
