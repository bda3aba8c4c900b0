use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::{
    config::{DeployConfig, DEFAULT_CONFIG_PATH},
    env::{EnvProvider, EnvironmentEntry, FileManifest, ValuePrecedence},
    priority::{get_priority, parse_rules},
    Result,
};

#[derive(Parser, Debug)]
#[command(name = "ecs-deploy")]
#[command(author, version)]
#[command(about = "Listener rule priorities and container environments for ECS deploys", long_about = None)]
pub struct Args {
    /// Deploy config file (defaults to deploy.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the lowest free priority for a new listener rule
    Priority {
        /// describe-rules JSON; read from stdin when omitted or "-"
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Print the container environment composed from the manifest
    Environment {
        /// Manifest path, overriding the config
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Let the process environment override inline manifest values
        #[arg(long)]
        prefer_env: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

/// An explicit `--config` must exist; the default path is optional.
pub fn load_config(args: &Args) -> Result<DeployConfig> {
    match &args.config {
        Some(path) => DeployConfig::load(path),
        None => DeployConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH)),
    }
}

pub fn run_priority<R: Read, W: Write>(
    rules_path: Option<&Path>,
    mut stdin: R,
    out: &mut W,
) -> Result<()> {
    let json = match rules_path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            stdin.read_to_string(&mut buf)?;
            buf
        }
    };
    let rules = parse_rules(&json)?;
    let priority = get_priority(&rules)?;
    writeln!(out, "{}", priority)?;
    Ok(())
}

pub fn render_text(entries: &[EnvironmentEntry], color: bool) -> String {
    let mut output = String::new();
    for entry in entries {
        if color {
            output.push_str(&format!("{}={}\n", entry.name.bright_blue(), entry.value));
        } else {
            output.push_str(&format!("{}={}\n", entry.name, entry.value));
        }
    }
    output
}

pub fn run_environment<E, W>(
    config: &DeployConfig,
    env: &E,
    format: OutputFormat,
    color: bool,
    out: &mut W,
) -> Result<()>
where
    E: EnvProvider + ?Sized,
    W: Write,
{
    let source = FileManifest::new(&config.manifest);
    let entries = config.composer().generate(&source, env)?;
    tracing::info!(
        manifest = %config.manifest.display(),
        count = entries.len(),
        "Composed container environment"
    );

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &entries)?;
            writeln!(out)?;
        }
        OutputFormat::Text => write!(out, "{}", render_text(&entries, color))?,
    }
    Ok(())
}

pub fn run(args: Args) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &args.command {
        Command::Priority { rules } => run_priority(rules.as_deref(), std::io::stdin(), &mut out),
        Command::Environment {
            manifest,
            prefer_env,
            format,
        } => {
            let mut config = load_config(&args)?;
            if let Some(path) = manifest {
                config.manifest = path.clone();
            }
            if *prefer_env {
                config.precedence = ValuePrecedence::Environment;
            }
            let color = std::io::IsTerminal::is_terminal(&std::io::stdout());
            run_environment(&config, &crate::env::ProcessEnv, *format, color, &mut out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_environment_args() {
        let args = Args::try_parse_from([
            "ecs-deploy",
            "environment",
            "--manifest",
            "app.env",
            "--prefer-env",
            "--format",
            "text",
            "--debug",
        ])
        .unwrap();
        assert!(args.debug);
        match args.command {
            Command::Environment {
                manifest,
                prefer_env,
                format,
            } => {
                assert_eq!(manifest, Some(PathBuf::from("app.env")));
                assert!(prefer_env);
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_render_text_plain() {
        let entries = vec![
            EnvironmentEntry::new("ENV", "Dev"),
            EnvironmentEntry::new("REALM", "NonProd"),
        ];
        assert_eq!(render_text(&entries, false), "ENV=Dev\nREALM=NonProd\n");
    }
}
