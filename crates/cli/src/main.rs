//! `labyrinth` — CLI entry point for the grid-based esolang interpreter.
//!
//! ```text
//! labyrinth (-f FILE | -e EXPR) [-d] [int ...]
//! ```

mod debug;
mod source;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

use labyrinth_runtime::{DebugOptions, Engine, Grid, NullRenderer, Random};

#[derive(Parser)]
#[command(name = "labyrinth")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for the Labyrinth grid-based esolang", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "expr"])))]
struct Cli {
    /// Load the program from a source file.
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: Option<PathBuf>,

    /// Program source given directly on the command line.
    #[arg(short = 'e', long = "expr", value_name = "EXPR")]
    expr: Option<String>,

    /// Render each tick to the terminal (board + stacks) as it executes.
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Integer seeds pushed onto the initial maiden's stack, left to right.
    #[arg(allow_negative_numbers = true)]
    seeds: Vec<i64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let source = match source::load(cli.file.as_deref(), cli.expr.as_deref()) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("labyrinth: {e}");
            return ExitCode::from(1);
        }
    };

    tracing::debug!(file = ?cli.file, has_expr = cli.expr.is_some(), "source loaded");

    let grid = Grid::load(&source);
    let mut engine = Engine::new(grid, &cli.seeds, Random::from_entropy());
    engine.debug = DebugOptions {
        enabled: cli.debug,
        print_board: cli.debug,
        print_stacks: cli.debug,
        ..DebugOptions::default()
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let run_result = if cli.debug {
        let mut renderer = debug::TerminalRenderer::new();
        engine.run(&mut out, &mut renderer)
    } else {
        engine.run(&mut out, &mut NullRenderer)
    };

    let _ = out.flush();

    match run_result {
        Ok(code) => ExitCode::from(code.rem_euclid(256) as u8),
        Err(e) => {
            eprintln!("labyrinth: {e}");
            ExitCode::from(1)
        }
    }
}
