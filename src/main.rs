use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use strategy_runner::api::HttpStrategyApi;
use strategy_runner::app::App;
use strategy_runner::commands;
use strategy_runner::config::Config;
use strategy_runner::logging::{log, obj, v_str, Domain, Level};

/// Send a strategy prompt to the strategy service and show the backtest.
#[derive(Parser, Debug)]
#[command(name = "strategy-runner", long_about = None)]
struct Cli {
    /// Service root (overrides STRATEGY_API_BASE).
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Frame width in columns (overrides RENDER_WIDTH).
    #[arg(long, global = true)]
    width: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit one prompt and print the result.
    Run {
        /// Prompt words, joined with spaces.
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        prompt: Vec<String>,

        /// Print the response body instead of the rendered frame.
        #[arg(long)]
        json: bool,
    },
    /// List runs stored by the service.
    List,
    /// Show one stored run.
    Show { id: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = Config::from_env()?;
    if let Some(base) = &cli.api_base {
        cfg = cfg.with_api_base(base)?;
    }
    if let Some(width) = cli.width {
        cfg = cfg.with_render_width(width);
    }
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[("api_base", v_str(cfg.api_base.as_str()))]),
    );

    let width = cfg.render_width;
    let api = Arc::new(HttpStrategyApi::new(cfg));
    let mut stdout = std::io::stdout();

    match cli.command {
        None => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            App::new(api, width).run(stdin, &mut stdout).await
        }
        Some(Commands::Run { prompt, json }) => {
            commands::run(api.as_ref(), &prompt.join(" "), json, width, &mut stdout).await
        }
        Some(Commands::List) => commands::list(api.as_ref(), &mut stdout).await,
        Some(Commands::Show { id }) => commands::show(api.as_ref(), id, &mut stdout).await,
    }
}
