//! CLI tool to run pipeline (.pipe) files against a JSON customer file.
//!
//! Usage:
//!   stream-run run <pipeline.pipe> <customers.json>
//!   stream-run run <pipeline.pipe> <customers.json> -o <output.txt>
//!   stream-run scores <file> <values...> [--keep-existing]
//!   stream-run greet <name> [--language spanish]
//!
//! If no output file is specified, writes to stdout.

use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::path::PathBuf;
use std::process;
use streams_rs::{
    AppendOptions, Greeting, Language, Result, Sink, WriterSink, greeting_for, load_customers,
    parse_commands, plan, run_plan, write_scores,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Run declarative customer pipelines and functional-interface demos.
#[derive(Parser)]
#[command(name = "stream-run", version)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline file against customer records
    Run {
        /// Pipeline definition file (.pipe)
        pipeline: PathBuf,

        /// Customer data file (JSON array)
        input: PathBuf,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Append numbers to a text file, one "{n} " per value
    Scores {
        /// Target file
        file: PathBuf,

        /// Values to append
        #[arg(required = true)]
        values: Vec<i64>,

        /// Append to an existing file instead of replacing it
        #[arg(long)]
        keep_existing: bool,
    },
    /// Greet someone
    Greet {
        name: String,

        #[arg(short, long, value_enum, default_value_t = Language::English)]
        language: Language,
    },
}

/// Settings for a pipeline run, resolved from the command line.
struct RunConfig {
    pipeline: PathBuf,
    input: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(config: &RunConfig) -> Result<()> {
    let pipeline_text = fs::read_to_string(&config.pipeline)?;
    let commands = parse_commands(&pipeline_text)?;
    let plan = plan(commands)?;

    // Load after the pipeline parses, before any stage runs.
    let customers = load_customers(&config.input)?;

    if config.verbose {
        eprintln!("Pipeline: {}", config.pipeline.display());
        eprintln!("Input:    {}", config.input.display());
        eprintln!(
            "Output:   {}",
            config
                .output
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(stdout)".to_string())
        );
        eprintln!("Stages:   {}", plan.describe().join(" | "));
    }

    let (outcome, input_count) = run_plan(plan, &customers)?;
    let lines = outcome.lines();

    match &config.output {
        Some(out_path) => {
            if let Some(parent) = out_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            let mut sink = WriterSink::new(File::create(out_path)?);
            sink.emit_all(&lines)?;
        }
        None => WriterSink::stdout().emit_all(&lines)?,
    }

    info!(input_count, output_count = lines.len(), "pipeline finished");
    if config.verbose {
        eprintln!("Records:  {input_count} in -> {} out", lines.len());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            pipeline,
            input,
            output,
        } => run(&RunConfig {
            pipeline,
            input,
            output,
            verbose: cli.verbose > 0,
        }),
        Commands::Scores {
            file,
            values,
            keep_existing,
        } => {
            let options = AppendOptions {
                replace_existing: !keep_existing,
            };
            write_scores(&file, &values, options).map(|report| {
                for failure in &report.failures {
                    eprintln!("Failed to write value #{}: {}", failure.index, failure.error);
                }
                eprintln!(
                    "Wrote {} of {} values to {}",
                    report.written,
                    values.len(),
                    file.display()
                );
            })
        }
        Commands::Greet { name, language } => {
            println!("{}", greeting_for(language).greet(&name));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
