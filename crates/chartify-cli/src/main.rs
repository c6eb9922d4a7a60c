//! Chartify CLI - create Helm charts from Kubernetes objects

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "chartify")]
#[command(version)]
#[command(about = "Create Helm charts from Kubernetes objects", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Log progress while generating
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a chart from manifest files or live cluster objects
    Create(commands::create::CreateArgs),
}

/// Install the log subscriber. `RUST_LOG` wins over the flags.
fn init_logging(debug: bool, verbose: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug, cli.verbose);

    let result = match cli.command {
        Commands::Create(args) => commands::create::run(&args),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
