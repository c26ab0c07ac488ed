mod commands;
mod exit_code;
mod progress;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use exit_code::ExitCode;

#[derive(Parser)]
#[command(name = "blindql")]
#[command(about = "Reconstruct GraphQL schemas from endpoints with introspection disabled", long_about = None)]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Path to blindql config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Force colored output even when not a TTY
    #[arg(long, global = true, conflicts_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long, global = true, conflicts_with = "color")]
    no_color: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Suppress progress indicators (spinners)
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output verbosity options
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    /// Whether to show progress indicators (spinners)
    pub show_progress: bool,
    /// Whether to show informational output (summaries)
    pub show_info: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a schema by probing field names against an endpoint
    ///
    /// Candidate names come from a wordlist. Probe queries are batched with
    /// aliases and the server's error messages are mined for field names, types
    /// and arguments. Press Ctrl-C to stop early and keep what was found.
    Reconstruct(commands::reconstruct::ReconstructArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();
    configure_colors(cli.color, cli.no_color);

    let output_opts = OutputOptions {
        show_progress: !cli.quiet && !cli.no_progress,
        show_info: !cli.quiet,
    };

    match cli.command {
        Commands::Reconstruct(args) => {
            commands::reconstruct::run(cli.config, &args, output_opts).await
        }
    }
}

/// Logs go to stderr so they never mix with schema JSON on stdout.
/// Silent unless `RUST_LOG` is set.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Configure colored output based on flags and environment variables.
///
/// See [`color_override`] for the precedence rules.
fn configure_colors(force_color: bool, no_color: bool) {
    let env = |name: &str| std::env::var_os(name).map(|v| v.to_string_lossy().into_owned());
    match color_override(force_color, no_color, env) {
        Some(enabled) => colored::control::set_override(enabled),
        None => colored::control::unset_override(),
    }
}

/// Decides whether to force colors on or off, or leave it to TTY detection.
///
/// Priority order (highest to lowest):
/// 1. `--color` / `--no-color` flags
/// 2. `NO_COLOR` (present with any value disables colors)
/// 3. `CLICOLOR_FORCE` (non-empty and not "0" forces colors)
/// 4. `CLICOLOR=0` disables colors
///
/// See: <https://no-color.org/> and <https://bixense.com/clicolors/>
fn color_override(
    force_color: bool,
    no_color: bool,
    env: impl Fn(&str) -> Option<String>,
) -> Option<bool> {
    if force_color {
        return Some(true);
    }
    if no_color || env("NO_COLOR").is_some() {
        return Some(false);
    }
    if let Some(val) = env("CLICOLOR_FORCE") {
        return (!val.is_empty() && val != "0").then_some(true);
    }
    match env("CLICOLOR").as_deref() {
        Some("0") => Some(false),
        _ => None,
    }
}
