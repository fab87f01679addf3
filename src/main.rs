//! Dessert - unit tests from a paused debugger frame
//!
//! Command-line front end: inspects projects, shows where tests land, and
//! replays recorded frame snapshots through the generation pipeline.

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dessert::config::{API_BASE_ENV, MODEL_ENV, PROVIDER_ENV};
use dessert::snapshot::{FrameSnapshot, ReplaySession};
use dessert::{
    DessertError, GeneratorConfig, PathResolver, Pipeline, ProgressReporter, ProjectInspector,
    RunOutcome, SourceLanguage, Stage,
};

/// Exit status for a run stopped by the user.
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(name = "dessert")]
#[command(version = "0.1.0")]
#[command(about = "Generate unit tests from a paused debugger frame", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the detected build system and project layout
    Detect {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve (and create) the test directory for a source file
    Resolve {
        /// Source file, absolute or relative to the project directory
        source: PathBuf,
    },

    /// Generate a test from a recorded frame snapshot
    Generate {
        /// Recorded frame snapshot (JSON)
        #[arg(short, long, value_name = "FILE")]
        snapshot: PathBuf,

        /// AI provider: openai, claude, or gemini (overrides AI_PROVIDER)
        #[arg(long, value_name = "PROVIDER")]
        provider: Option<String>,

        /// Model name (overrides MODEL_NAME)
        #[arg(long, value_name = "MODEL")]
        model: Option<String>,

        /// Provider endpoint override (overrides API_BASE)
        #[arg(long, value_name = "URL", hide = true)]
        api_base: Option<String>,

        /// Wait for variable extraction in milliseconds
        #[arg(long, default_value = "3000", value_name = "MS")]
        extraction_timeout: u64,

        /// Do not show the progress spinner
        #[arg(long)]
        no_progress: bool,
    },
}

/// Terminal progress for a generation run.
struct SpinnerReporter {
    bar: ProgressBar,
}

impl SpinnerReporter {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressReporter for SpinnerReporter {
    fn stage(&self, stage: &Stage) {
        self.bar.set_position((stage.fraction() * 100.0).round() as u64);
        self.bar.set_message(stage.label());
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "dessert=debug,info"
    } else {
        "dessert=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Resolve project path
    let project_path = cli.project.canonicalize().unwrap_or(cli.project.clone());

    if !project_path.exists() {
        eprintln!(
            "{} Project directory does not exist: {}",
            "Error:".red().bold(),
            project_path.display()
        );
        std::process::exit(1);
    }

    match cli.command {
        Commands::Detect { json } => {
            let inspector = ProjectInspector::new(&project_path);
            let build_system = inspector.build_system();
            let multiplatform = inspector.is_multiplatform();
            let descriptors = inspector.descriptor_files(build_system);

            if json {
                let report = serde_json::json!({
                    "root": project_path,
                    "build_system": build_system.display_name(),
                    "multiplatform": multiplatform,
                    "descriptors": descriptors,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} {}",
                    "Build system:".bold(),
                    build_system.display_name().cyan()
                );
                println!(
                    "   Multiplatform: {}",
                    if multiplatform { "yes" } else { "no" }
                );
                if descriptors.is_empty() {
                    println!("   Descriptor: {}", "none found".dimmed());
                }
                for descriptor in &descriptors {
                    println!("   Descriptor: {}", descriptor.display());
                }
            }
        }

        Commands::Resolve { source } => {
            let source = absolutize(&project_path, source);
            let file_name = source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let Some(language) = SourceLanguage::from_file_name(&file_name) else {
                fail(&DessertError::UnsupportedLanguage { file_name }, false);
            };

            let inspector = ProjectInspector::new(&project_path);
            let resolver = PathResolver::new(&project_path, inspector.build_system())
                .multiplatform(inspector.is_multiplatform());
            let target = resolver
                .resolve(&source, language)
                .unwrap_or_else(|e| fail(&e, false));
            println!("{}", target.absolute_path.display());
            if target.has_existing_content() {
                println!("   {} existing test will be extended", "Info:".blue());
            } else {
                println!("   {} new test will be created", "Info:".blue());
            }
        }

        Commands::Generate {
            snapshot,
            provider,
            model,
            api_base,
            extraction_timeout,
            no_progress,
        } => {
            // Flags take precedence over the environment
            let config = GeneratorConfig::from_lookup(|name| match name {
                PROVIDER_ENV if provider.is_some() => provider.clone(),
                MODEL_ENV if model.is_some() => model.clone(),
                API_BASE_ENV if api_base.is_some() => api_base.clone(),
                _ => std::env::var(name).ok(),
            })
            .unwrap_or_else(|e| fail(&e, true));

            let snapshot_path = absolutize(&project_path, snapshot);
            let frame = FrameSnapshot::load(&snapshot_path)
                .unwrap_or_else(|e| fail(&e, true))
                .into_frame(&project_path);

            let mut pipeline = Pipeline::new(&config)
                .with_extraction_timeout(Duration::from_millis(extraction_timeout));
            if !no_progress {
                pipeline = pipeline.with_reporter(Arc::new(SpinnerReporter::new()));
            }

            let cancel = pipeline.cancellation();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            println!(
                "{} Generating test with {} ({})",
                "Info:".blue(),
                config.provider,
                config.model
            );

            let project = Some(project_path.clone());
            match pipeline.run(Arc::new(frame), &ReplaySession, &project).await {
                Ok(RunOutcome::Written(path)) => {
                    println!(
                        "\n{} Test file written: {}",
                        "OK".green().bold(),
                        path.display()
                    );
                }
                Ok(RunOutcome::Cancelled) => {
                    println!("\n{} Cancelled, no file written", "Warning:".yellow());
                    std::process::exit(EXIT_CANCELLED);
                }
                Err(e) => fail(&e, true),
            }
        }
    }

    Ok(())
}

fn absolutize(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

fn fail(error: &DessertError, generating: bool) -> ! {
    let message = if generating {
        error.user_message()
    } else {
        error.to_string()
    };
    eprintln!("{} {}", "Error:".red().bold(), message);
    std::process::exit(error.exit_code());
}
