//! React Agent - command line entry point.
//!
//! `ask` answers one question, `serve` starts the HTTP API, `tools` prints
//! the tool catalog.

use clap::{Parser, Subcommand};
use react_agent::{
    agent::{Agent, AgentError},
    api,
    config::Config,
    tools::ToolRegistry,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "react-agent", version, about = "Reason + Act agent over an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,

        /// Override MAX_ITERATIONS for this run
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Print the full transcript after the answer
        #[arg(long)]
        verbose: bool,
    },
    /// Start the HTTP server
    Serve,
    /// List the built-in tools
    Tools {
        /// Include the shell tool
        #[arg(long)]
        shell: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "react_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Tools { shell } => {
            for tool in ToolRegistry::with_defaults(shell).list_tools() {
                println!("{:<14} {}", tool.name, tool.description);
            }
            Ok(())
        }
        Command::Serve => {
            let config = Config::from_env()?;
            info!("Loaded configuration: model={}", config.default_model);
            api::serve(config).await
        }
        Command::Ask {
            question,
            max_iterations,
            verbose,
        } => {
            let mut config = Config::from_env()?;
            if let Some(n) = max_iterations {
                config.max_iterations = n;
            }
            info!("Loaded configuration: model={}", config.default_model);

            let agent = Agent::from_config(&config)?;
            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                });
            }

            match agent.run(&question, &cancel).await {
                Ok(out) => {
                    if verbose {
                        for fragment in &out.transcript {
                            eprintln!("{}", fragment);
                        }
                    }
                    println!("{}", out.output);
                    Ok(())
                }
                Err(AgentError::Cancelled { .. }) => {
                    eprintln!("Cancelled");
                    std::process::exit(130);
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
