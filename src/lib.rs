//! Terminal client for a remote strategy generation service.
//!
//! A prompt goes out as `POST /run-strategy`; the returned strategy and its
//! backtest metrics are drawn by [`view::StrategyRunnerView`].

pub mod api;
pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod render;
pub mod view;
