use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use delver_core::clarify::ClarificationQuestion;
use delver_core::llm::Provider;
use delver_core::{
    ClarificationHandler, ClarificationReply, Config, ProceedWithoutAnswers, ResearchEvent,
    ResearchManager,
};

#[derive(Parser)]
#[command(name = "delver")]
#[command(about = "AI research assistant: clarifies, plans, searches, and writes a report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Research a query and print the report
    Research {
        /// What you want to research
        #[arg(required = true)]
        query: Vec<String>,

        /// Path to a config file (defaults to delver.toml, then user config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip clarification questions and research the query as-is
        #[arg(long)]
        no_clarify: bool,

        /// Write the report to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config {
        /// Path to a config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Answers clarification questions from stdin.
struct StdinAnswers;

#[async_trait::async_trait]
impl ClarificationHandler for StdinAnswers {
    async fn answer(&mut self, questions: &[ClarificationQuestion]) -> ClarificationReply {
        println!("\nA few questions before researching:\n");
        for question in questions {
            println!("  - {}", question.question);
        }
        println!("\nAnswer in one message (empty to skip, 'q' to abort):");

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        match line {
            Ok(Ok(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    ClarificationReply::Proceed
                } else if line == "q" {
                    ClarificationReply::Cancel
                } else {
                    ClarificationReply::Answer(line.to_string())
                }
            }
            _ => ClarificationReply::Cancel,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, String> {
    match path {
        Some(path) => Config::from_file(path).map_err(|e| e.to_string()),
        None => Config::load().map_err(|e| e.to_string()),
    }
}

/// Renders lifecycle events as terminal progress.
async fn render_events(mut rx: mpsc::UnboundedReceiver<ResearchEvent>) {
    let mut searches: Option<ProgressBar> = None;

    while let Some(event) = rx.recv().await {
        match event {
            ResearchEvent::ClarificationNeeded { .. } => {}
            ResearchEvent::QueryClarified { query } => {
                eprintln!("Researching: {query}");
            }
            ResearchEvent::PlanProduced { directives } => {
                eprintln!("Planned {directives} searches");
                let bar = ProgressBar::new(directives as u64);
                if let Ok(style) =
                    ProgressStyle::with_template("  searching [{bar:30}] {pos}/{len}")
                {
                    bar.set_style(style.progress_chars("=> "));
                }
                searches = Some(bar);
            }
            ResearchEvent::SearchCompleted { completed, .. } => {
                if let Some(bar) = &searches {
                    bar.set_position(completed as u64);
                }
            }
            ResearchEvent::ReportReady => {
                if let Some(bar) = searches.take() {
                    bar.finish_and_clear();
                }
                eprintln!("Report ready");
            }
        }
    }
}

async fn run_research(
    query: String,
    config: Option<PathBuf>,
    no_clarify: bool,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let config = load_config(config.as_ref())?;
    tracing::debug!(provider = %config.llm.provider, "configuration loaded");

    let llm = Provider::from_config(&config.llm)
        .build()
        .map_err(|e| e.to_string())?;

    let (tx, rx) = mpsc::unbounded_channel();
    let events = tokio::spawn(render_events(rx));

    let manager = ResearchManager::new(Arc::from(llm), &config).with_events(tx);

    let report = if no_clarify {
        manager.run(&query, &mut ProceedWithoutAnswers).await
    } else {
        manager.run(&query, &mut StdinAnswers).await
    };

    // Manager dropped its sender when run returned; drain the display.
    drop(manager);
    let _ = events.await;

    let report = report.map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            std::fs::write(&path, report.to_markdown()).map_err(|e| e.to_string())?;
            println!("Report written to {}", path.display());
        }
        None => {
            println!("\n{}", report.to_markdown());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("delver=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Research {
            query,
            config,
            no_clarify,
            output,
        } => run_research(query.join(" "), config, no_clarify, output).await,
        Commands::Config { config } => match load_config(config.as_ref()) {
            Ok(config) => {
                match toml::to_string_pretty(&config) {
                    Ok(rendered) => {
                        println!("{rendered}");
                        Ok(())
                    }
                    Err(e) => Err(e.to_string()),
                }
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
