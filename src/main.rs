use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use filedate::{CancellationToken, CancelledError, ExtensionFilter, RestoreControl, RestoreOptions};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

#[derive(Parser)]
#[command(
    name = "filedate",
    version,
    about = "Restore file dates based on patterns found in their filenames",
    after_help = "Examples:\n  filedate ./photos\n  filedate ./photos --dry-run --verbose\n  filedate ./photos --ext jpg jpeg png"
)]
struct Cli {
    /// Folder for recursive processing
    folder: PathBuf,

    /// Run in simulation mode (does not modify files)
    #[arg(short = 's', long)]
    dry_run: bool,

    /// Show detailed information during processing
    #[arg(short, long)]
    verbose: bool,

    /// Only process files with these extensions (ex: jpg png mp4)
    #[arg(short, long, num_args = 1.., value_name = "EXTENSION")]
    ext: Vec<String>,

    /// Ignore common text files, process only images and videos
    #[arg(long)]
    ignore_text: bool,

    /// Logging detail level (RUST_LOG overrides it)
    #[arg(long, value_enum, ignore_case = true, default_value = "info")]
    log: LogLevel,

    /// Write a JSON summary of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,
}

impl Cli {
    fn filter(&self) -> ExtensionFilter {
        if !self.ext.is_empty() {
            ExtensionFilter::only(&self.ext[..])
        } else if self.ignore_text {
            ExtensionFilter::MediaOnly
        } else {
            ExtensionFilter::Any
        }
    }
}

fn init_logging(cli: &Cli) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = if cli.verbose { "debug" } else { cli.log.as_filter() };
        tracing_subscriber::EnvFilter::new(level)
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        if e.downcast_ref::<CancelledError>().is_some() {
            tracing::warn!("Process interrupted by user.");
        } else {
            tracing::error!("Error during processing: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = RestoreOptions {
        root: cli.folder.clone(),
        dry_run: cli.dry_run,
        filter: cli.filter(),
    };

    match &options.filter {
        ExtensionFilter::Only(exts) => {
            tracing::info!("Processing only files with extensions: {}", exts.join(", "))
        }
        ExtensionFilter::MediaOnly => tracing::info!("Ignoring text files. Processing only media files."),
        ExtensionFilter::Any => {}
    }
    let mode = if options.dry_run { "SIMULATION" } else { "PRODUCTION" };
    tracing::info!("Starting in {} mode", mode);
    tracing::info!("Source folder: {}", options.root.display());

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel()).context("Failed to install Ctrl-C handler")?;
    let control = RestoreControl::new().with_cancel_token(token);

    let pb = if cli.progress {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40}] {pos}/{len} {msg}")
                .context("Invalid progress template")?,
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let report = filedate::restore_dates(&options, &control, &|current, total, message| {
        pb.set_length(total);
        pb.set_position(current + 1);
        pb.set_message(message.to_string());
    })?;
    pb.finish_and_clear();

    tracing::info!("Processing completed in {:.2} seconds", report.elapsed_secs);
    tracing::info!("Total files analyzed: {}", report.total_files);
    tracing::info!("Files with restored dates: {}", report.recognized);
    tracing::info!("Files without recognized patterns: {}", report.unrecognized.len());
    if report.failed > 0 {
        tracing::warn!("Files whose dates could not be changed: {}", report.failed);
    }
    if !report.unrecognized.is_empty() && tracing::enabled!(tracing::Level::DEBUG) {
        tracing::info!("Files without recognized pattern:");
        for path in &report.unrecognized {
            tracing::info!("  - {}", path.display());
        }
    }

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    Ok(())
}
