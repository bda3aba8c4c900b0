use anyhow::Context;
use clap::Parser;
use ecs_deploy::cli::{self, Args};
use tracing_subscriber::EnvFilter;

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries the JSON output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let command = match &args.command {
        cli::Command::Priority { .. } => "priority",
        cli::Command::Environment { .. } => "environment",
    };
    let result = cli::run(args).with_context(|| format!("{} failed", command));

    match result {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
}
