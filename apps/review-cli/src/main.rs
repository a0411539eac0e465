//! Review CLI
//!
//! Drives a review project from the command line: run the validation
//! backend, inspect page status and overlays, resolve issues, and export
//! the annotated document or a CSV report. Results go to stdout as JSON,
//! logs go to stderr.

mod config;
mod http_backend;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use config::AppConfig;
use http_backend::HttpBackend;
use review_core::{
    check_document, pointer_to_document_offset, FsProjectStorage, GuideConfig, Mutation,
    ReviewSession, ValidationBackend,
};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "review")]
#[command(version, about = "Review detected formatting issues in a document")]
struct Args {
    /// Config file (defaults to ./review.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project directory holding document.pdf and document_result.json
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Validation backend URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Guide configuration JSON (margin_mm, indent_rules)
    #[arg(long)]
    guides: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the validation backend on the project document and store the result
    Check,
    /// Review statistics and the status of every page
    Status,
    /// Flip the resolved flag of one issue
    Toggle { id: usize },
    /// Mark every issue on a page resolved (or open again with --reopen)
    ResolvePage {
        page: u32,
        #[arg(long)]
        reopen: bool,
    },
    /// Resolve a page if anything on it is open, otherwise reopen it
    TogglePage { page: u32 },
    /// Resolve everything open on a page and print the next page
    Approve { page: u32 },
    /// First page after PAGE that still needs attention
    Next { page: u32 },
    /// Markers and guides for one page, in render-space percentages
    Overlay { page: u32 },
    /// Ruler reading for a pointer position given as a fraction of page width
    Measure {
        #[arg(allow_negative_numbers = true)]
        fraction: f64,
    },
    /// Write a copy of the document with open issues drawn in
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// CSV report of open issues
    Report {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Whether the validation backend is reachable
    BackendStatus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(url) = args.backend_url {
        config.backend.url = url;
    }
    if let Some(path) = args.guides {
        config.guides.config_path = Some(path);
    }
    if let Some(dir) = args.project {
        config.project.dir = Some(dir);
    }

    run(args.command, &config).await
}

async fn run(command: Command, config: &AppConfig) -> anyhow::Result<()> {
    let project = match (&command, &config.project.dir) {
        (Command::BackendStatus, _) => return backend_status(config).await,
        (_, Some(dir)) => dir.clone(),
        (_, None) => bail!("No project directory; pass --project or set [project] dir"),
    };
    let storage = FsProjectStorage::new(&project);
    let mut session = ReviewSession::open(storage).await;
    session.measure().await;

    match command {
        Command::Check => {
            let document = session.storage().document_path();
            if !document.exists() {
                bail!("No document at {}", document.display());
            }
            let backend = HttpBackend::new(&config.backend.url, config.backend.timeout())?;
            let document = document.canonicalize().unwrap_or(document);
            match check_document(&backend, &document).await {
                Some(store) => {
                    session
                        .replace(store)
                        .await
                        .context("Failed to save check result")?;
                    print_json(&json!({ "checked": true, "stats": session.stats() }))
                }
                None => print_json(&json!({ "checked": false, "stats": session.stats() })),
            }
        }
        Command::Status => {
            let pages: Vec<_> = (1..=session.page_count())
                .map(|page| json!({ "page": page, "status": session.page_status(page) }))
                .collect();
            print_json(&json!({
                "stats": session.stats(),
                "complete": session.stats().is_complete(),
                "pages": pages,
            }))
        }
        Command::Toggle { id } => {
            let mutation = session.toggle_issue(id).await?;
            report_mutation(mutation, |is_ignored| json!({ "id": id, "isIgnored": is_ignored }))
        }
        Command::ResolvePage { page, reopen } => {
            let mutation = session.set_page_resolution(page, !reopen).await;
            report_mutation(mutation, |count| {
                json!({ "page": page, "resolved": !reopen, "issues": count })
            })
        }
        Command::TogglePage { page } => {
            let mutation = session.toggle_page(page).await;
            report_mutation(mutation, |state| json!({ "page": page, "resolved": state }))
        }
        Command::Approve { page } => {
            let mutation = session.approve_and_next(page).await;
            report_mutation(mutation, |outcome| {
                json!({ "page": page, "resolved": outcome.resolved, "nextPage": outcome.next_page })
            })
        }
        Command::Next { page } => {
            let next = session.next_problem_page(page);
            print_json(&json!({ "nextPage": next, "complete": next.is_none() }))
        }
        Command::Overlay { page } => {
            let guides = load_guides(config)?;
            print_json(&session.overlay(page, guides.as_ref()))
        }
        Command::Measure { fraction } => {
            let guides = load_guides(config)?;
            let left_margin = guides.as_ref().and_then(|g| g.left_margin_mm()).unwrap_or(0.0);
            let reading =
                pointer_to_document_offset(fraction, session.page_size().width, left_margin);
            print_json(&json!({ "available": reading.is_some(), "reading": reading }))
        }
        Command::Export { output } => {
            let annotated = session.export_annotated().await?;
            let output = output.unwrap_or_else(|| project.join("document_reviewed.pdf"));
            tokio::fs::write(&output, &annotated.bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            print_json(&json!({
                "output": output,
                "drawn": annotated.drawn,
                "offPage": annotated.off_page,
                "drawErrors": annotated.draw_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            }))
        }
        Command::Report { output } => {
            let report = review_core::issue_report_string(session.store().issues())?;
            match output {
                Some(path) => write_text(&path, &report).await,
                None => {
                    print!("{}", report);
                    Ok(())
                }
            }
        }
        Command::BackendStatus => backend_status(config).await,
    }
}

async fn backend_status(config: &AppConfig) -> anyhow::Result<()> {
    let backend = HttpBackend::new(&config.backend.url, config.backend.timeout())?;
    let online = backend.is_online().await;
    print_json(&json!({ "url": config.backend.url, "online": online }))
}

/// Print a mutation's value; a failed save is reported after the output
fn report_mutation<T>(
    mutation: Mutation<T>,
    render: impl FnOnce(T) -> serde_json::Value,
) -> anyhow::Result<()> {
    let Mutation { value, persisted } = mutation;
    print_json(&render(value))?;
    persisted.context("Change applied but not saved")?;
    Ok(())
}

fn load_guides(config: &AppConfig) -> anyhow::Result<Option<GuideConfig>> {
    let Some(path) = &config.guides.config_path else {
        return Ok(None);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read guide config: {}", path.display()))?;
    let guides = GuideConfig::from_json(&json)
        .with_context(|| format!("Invalid guide config: {}", path.display()))?;
    Ok(Some(guides))
}

async fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote report");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
