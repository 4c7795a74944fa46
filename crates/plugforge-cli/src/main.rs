use clap::{Parser, Subcommand};
use colored::Colorize;
use plugforge::{
    commands::compile::{self, CompileCommand},
    GlobalOpts,
};
use plugforge_logger as logger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "plugforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Plugin repository builder",
    long_about = "plugforge discovers CLI plugins, validates them, cross-compiles them for every target and writes a manifest describing the result."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile plugins (and optionally the core binary) into a local repository
    Compile(CompileCommand),
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("PLUGFORGE_LOG")
                .unwrap_or_else(|_| "plugforge=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) =
        logger::init_with_verbosity(cli.global.verbosity_level(), !cli.global.no_log_file)
    {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing();

    match cli.command {
        Commands::Compile(cmd) => match compile::handle_compile(cmd) {
            Ok(report) => {
                logger::success(&format!(
                    "successfully built local repository: {} plugin(s){}, {} artifact(s) in {:.1}s, manifest at {}",
                    report.plugins.len(),
                    if report.core.is_some() { " and core" } else { "" },
                    report.artifact_count(),
                    report.elapsed.as_secs_f64(),
                    report.manifest_path.display()
                ));
            }
            Err(e) => {
                logger::error(&e.to_string());
                if let Some(output) = e.captured_output() {
                    let prefix = e.worker_id().map(|id| format!("{} - ", id)).unwrap_or_default();
                    eprintln!("{}{}\n{}", prefix, "output:".dimmed(), output.trim_end());
                }
                logger::show_log_path();
                std::process::exit(1);
            }
        },
    }
}
