//! dcx CLI entry point

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use dcx::cli::{Cli, EXIT_OK, exit_code_for, render_error};
use dcx::commands::{self, Context};
use dcx::tracing::{TracingConfig, init_tracing};
use std::io::Write;

fn main() {
    #[allow(clippy::print_stderr)]
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = Cli::parse();
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("Warning: {e}");
    }

    let ctx = Context::resolve();
    tracing::debug!(root = %ctx.paths.root().display(), platform = %ctx.platform, "Resolved context");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = commands::execute(cli.command, &ctx, &mut out);
    let _ = out.flush();

    match result {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err);
            exit_code_for(&err)
        }
    }
}
