use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use plagcheck_core::{
    CheckInput, HttpCaller, OpenAiChat, Orchestrator, UploadedFile, config_file, load_config,
};
use plagcheck_pdf::PdfExtractBackend;

mod output;

use output::ColorMode;

/// Plagiarism Checker - Run text through plagiarism, AI-detection and rephrasing services
#[derive(Parser, Debug)]
#[command(name = "plagcheck", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check text or a PDF against every enabled plagiarism and AI detector
    Check(InputArgs),

    /// Rephrase text with the first working rephraser, then check the result
    Rephrase(InputArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// File to analyze; `.pdf` files are extracted, anything else is read as UTF-8
    file: Option<PathBuf>,

    /// Text to analyze instead of a file
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    /// Path to the services config (default: $CONFIG_PATH or config/services.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the response as JSON
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => check(args).await,
        Command::Rephrase(args) => rephrase(args).await,
    }
}

async fn check(args: InputArgs) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(args.config.as_ref())?;
    let input = read_input(args.file.as_ref(), args.text.clone())?;
    let text = input.resolve(Arc::new(PdfExtractBackend::new())).await?;

    let cancel = cancel_on_ctrl_c();
    let report = orchestrator.check(text, &cancel).await?;

    let mut writer = std::io::stdout();
    if args.json {
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writeln!(writer)?;
    } else {
        output::print_check_report(&mut writer, &report, ColorMode(!args.no_color))?;
    }
    Ok(())
}

async fn rephrase(args: InputArgs) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(args.config.as_ref())?;
    let input = read_input(args.file.as_ref(), args.text.clone())?;
    let text = input.resolve(Arc::new(PdfExtractBackend::new())).await?;

    let cancel = cancel_on_ctrl_c();
    let report = orchestrator.rephrase_and_check(text, &cancel).await?;

    let mut writer = std::io::stdout();
    if args.json {
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writeln!(writer)?;
    } else {
        output::print_rephrase_report(&mut writer, &report, ColorMode(!args.no_color))?;
    }
    Ok(())
}

/// Resolve configuration: `--config` > `CONFIG_PATH` > default path.
fn build_orchestrator(config: Option<&PathBuf>) -> anyhow::Result<Orchestrator> {
    let path = config.cloned().unwrap_or_else(config_file::config_path);
    let settings = load_config(&path)?.into_settings();
    tracing::debug!(config = %path.display(), ?settings, "configuration loaded");

    let caller = HttpCaller::default();
    let llm = OpenAiChat::new(caller.client().clone());
    Ok(Orchestrator::new(
        Arc::new(settings),
        Arc::new(caller),
        Arc::new(llm),
    ))
}

fn read_input(file: Option<&PathBuf>, text: Option<String>) -> anyhow::Result<CheckInput> {
    let Some(path) = file else {
        return Ok(CheckInput { text, file: None });
    };

    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let is_pdf = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(CheckInput {
            text: None,
            file: Some(UploadedFile {
                filename,
                data: std::fs::read(path)?,
            }),
        })
    } else {
        Ok(CheckInput {
            text: Some(std::fs::read_to_string(path)?),
            file: None,
        })
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });
    cancel
}
