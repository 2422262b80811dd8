use std::path::PathBuf;

use clap::Parser;
use padac_drv::{Config, Session};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// padac — compiles a Pascal/Ada-style source file to ARM assembly.
#[derive(Parser, Debug)]
#[command(name = "compile")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile a source file to ARM assembly", long_about = None)]
struct Cli {
    /// Source file to compile.
    source_file: PathBuf,

    /// Print the lowered AST's shape to stderr.
    #[arg(long)]
    print_ast: bool,

    /// Print every token the lexer produced to stderr.
    #[arg(long)]
    emit_tokens: bool,

    /// Enable debug-level tracing (also settable via RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .ok();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config {
        input_file: cli.source_file,
        print_ast: cli.print_ast,
        emit_tokens: cli.emit_tokens,
        verbose: cli.verbose,
    };

    let mut session = Session::new(config);
    if let Err(e) = session.compile() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
