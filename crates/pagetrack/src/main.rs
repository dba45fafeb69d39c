use anyhow::Context;
use clap::Parser;
use pagetrack_engine::cli::{self, FileOptions, OutputHandlers, ReplOptions};
use pagetrack_engine::config::ConfigLoader;
use pagetrack_engine::session::SessionContext;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagetrack", version, about = "Page-visit and custom-event tracker shell")]
struct Args {
    /// Config file (defaults to ./pagetrack.yaml, then ~/.pagetrack/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for session state; keeps the current page across restarts
    #[arg(long)]
    session_dir: Option<PathBuf>,

    /// Referrer reported with custom events
    #[arg(long)]
    referrer: Option<String>,

    /// Path the session starts on
    #[arg(long, default_value = "/")]
    start: String,

    /// Script of shell commands to execute (non-interactive mode)
    #[arg(long)]
    file: Option<PathBuf>,
}

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with shell output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    if let Some(dir) = args.session_dir {
        config.session.store_dir = Some(dir);
    }

    let mut context = SessionContext::builder(config)
        .referrer(args.referrer)
        .start(&args.start)?;

    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };

    let outcome = match &args.file {
        Some(script) => cli::run_file(
            &mut context,
            output,
            script,
            FileOptions {
                stop_on_error: true,
            },
        )
        .await
        .map(|summary| info!("Ran {} command(s) from {}", summary.executed, script.display())),
        None => {
            let repl_options = ReplOptions {
                banner_lines: &[
                    "Tracking started. Commands: goto <path>, event <type> [data], status, where, end-session.",
                    "Type 'exit' or 'quit' to close.",
                ],
                prompt: "> ",
                exit_commands: &["exit", "quit"],
                interrupt_message: Some("Interrupted"),
            };
            cli::run_repl(&mut context, output, repl_options).await
        }
    };

    // Detached timing posts still in flight would die with the runtime.
    let abandoned = context.flush(SHUTDOWN_GRACE).await;
    if abandoned > 0 {
        warn!("{} event(s) not delivered before shutdown", abandoned);
    }

    info!("Closing shell on {}", context.current_path());
    outcome.context("Shell stopped")
}
