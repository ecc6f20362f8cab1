//! @ai:module:intent CLI for the RKLLM benchmark harness
//! @ai:module:layer presentation

use anyhow::Result;
use clap::{Parser, Subcommand};
use rkllm_bench::{
    config::{BenchmarkConfig, RunConfiguration},
    launcher::InferenceLauncher,
    probe::SystemProbe,
    record::{BenchmarkRecord, GenerationReport},
    report::ReportReader,
    session::{BenchmarkSession, LaunchedSession, PreparedInvocation, SessionOutcome},
    template::TemplateRegistry,
    Error,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rkllm-bench")]
#[command(about = "Run RKLLM benchmarks and log performance metrics (tokens/s, RAM, NPU load)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare (and optionally launch and record) a benchmark run
    Run {
        /// Path to .rkllm model file
        model: PathBuf,

        /// Prompt for inference (default: state capitals)
        #[arg(short, long)]
        prompt: Option<String>,

        /// Maximum tokens to generate (default: 1024)
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Maximum context length (default: 4096)
        #[arg(long)]
        max_context: Option<u32>,

        /// Disable automatic chat template formatting
        #[arg(long)]
        no_template: bool,

        /// Output CSV file (default: benchmark_results.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run the inference tool in this terminal and wait for it
        #[arg(long)]
        launch: bool,

        /// Tokens generated, as reported by the NPU monitor
        #[arg(long)]
        total_tokens: Option<u64>,

        /// Generation time in seconds; with --launch defaults to the measured session time
        #[arg(long, requires = "total_tokens")]
        duration_secs: Option<f64>,
    },

    /// Print the prompt as it would be sent to a model
    Template {
        /// Model file name or identifier
        model: String,

        /// Prompt to format (default: state capitals)
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Summarise a benchmark log per model
    Summary {
        /// Benchmark CSV log
        #[arg(short, long, default_value = "benchmark_results.csv")]
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "benchmark.toml")]
        output: PathBuf,
    },
}

struct RunArgs {
    model: PathBuf,
    prompt: Option<String>,
    max_tokens: Option<u32>,
    max_context: Option<u32>,
    no_template: bool,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    launch: bool,
    total_tokens: Option<u64>,
    duration_secs: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rkllm_bench=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            model,
            prompt,
            max_tokens,
            max_context,
            no_template,
            output,
            config,
            launch,
            total_tokens,
            duration_secs,
        } => run_benchmark(RunArgs {
            model,
            prompt,
            max_tokens,
            max_context,
            no_template,
            output,
            config,
            launch,
            total_tokens,
            duration_secs,
        })
        .await,
        Commands::Template { model, prompt } => print_template(&model, prompt),
        Commands::Summary { input, json } => summarize(&input, json),
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Run one benchmark session
/// @ai:effects fs:read, fs:write, io
async fn run_benchmark(args: RunArgs) -> Result<()> {
    let config = load_or_default_config(args.config)?;

    let run_config = RunConfiguration {
        model_path: args.model,
        prompt: args.prompt.unwrap_or_else(|| config.run.prompt.clone()),
        max_tokens: args.max_tokens.unwrap_or(config.run.max_tokens),
        max_context: args.max_context.unwrap_or(config.run.max_context),
        apply_template: config.run.apply_template && !args.no_template,
        output: args.output.unwrap_or_else(|| config.run.output.clone()),
    };

    if args.total_tokens.is_some() && args.duration_secs.is_none() && !args.launch {
        anyhow::bail!("--total-tokens needs --duration-secs unless --launch measures the session");
    }

    let probe = Arc::new(SystemProbe::new(config.probe.clone()));
    let session = BenchmarkSession::new(probe, TemplateRegistry::builtin(), config.tool.clone());

    if !args.launch {
        let report = match (args.total_tokens, args.duration_secs) {
            (Some(tokens), Some(secs)) => Some(GenerationReport::new(tokens, secs)?),
            _ => None,
        };

        match session.run_session(&run_config, report).map_err(explain)? {
            SessionOutcome::InvocationPrepared(prepared) => {
                print_header(&run_config, &prepared);
                print_manual_steps(&prepared);
            }
            SessionOutcome::RecordComplete(record) => print_record(&record, &run_config.output),
        }
        return Ok(());
    }

    let prepared = session.prepare(&run_config).map_err(explain)?;
    print_header(&run_config, &prepared);
    println!("Prompt to paste: {}", prepared.prompt);
    println!();

    let output = prepared.output.clone();
    let launched = session
        .launch_and_record(
            prepared,
            &InferenceLauncher::new(),
            args.total_tokens,
            args.duration_secs,
        )
        .await?;

    match launched {
        LaunchedSession::Interrupted => {
            println!();
            println!("Benchmark interrupted by user");
        }
        LaunchedSession::Finished {
            record: Some(record),
            ..
        } => print_record(&record, &output),
        LaunchedSession::Finished {
            elapsed,
            record: None,
            ..
        } => {
            println!();
            println!("Session lasted {:.1}s. No record written.", elapsed.as_secs_f64());
            println!(
                "Re-run with --total-tokens N --duration-secs S to log this run to {}",
                output.display()
            );
        }
    }

    Ok(())
}

/// @ai:intent Log precondition failures for the operator before exiting non-zero
/// @ai:effects io
fn explain(err: Error) -> anyhow::Error {
    if err.is_fatal_precondition() {
        tracing::error!("{}", err);
        anyhow::Error::new(err).context("Benchmark cannot start")
    } else {
        err.into()
    }
}

/// @ai:intent Print the session banner and baseline
/// @ai:effects io
fn print_header(run_config: &RunConfiguration, prepared: &PreparedInvocation) {
    let preview: String = run_config.prompt.chars().take(50).collect();

    println!();
    println!("{}", "=".repeat(60));
    println!("Model: {}", prepared.model_name);
    println!("Prompt: {}...", preview);
    println!(
        "Max tokens: {}, Max context: {}",
        run_config.max_tokens, run_config.max_context
    );
    println!("{}", "=".repeat(60));
    println!();
    println!("Baseline RAM: {}", prepared.baseline.memory_display());
    println!("Baseline NPU: {}", prepared.baseline.accelerator_display());
    println!();
    println!("Command: {}", prepared.command);
}

/// @ai:intent Print instructions for the manual two-terminal run
/// @ai:effects io
fn print_manual_steps(prepared: &PreparedInvocation) {
    println!("Prompt to paste: {}", prepared.prompt);
    println!();
    println!("The inference tool is interactive: run it manually and use the NPU monitor");
    println!("in another terminal, then log the result with --total-tokens/--duration-secs.");
    println!();
    println!("Manual steps:");
    for step in prepared.manual_steps() {
        println!("  {}", step);
    }
}

/// @ai:intent Print a persisted record
/// @ai:effects io
fn print_record(record: &BenchmarkRecord, output: &Path) {
    println!();
    println!(
        "Tokens/s: {}  ({} tokens in {:.1}s)",
        record.tokens_per_second.display_with(|tps| format!("{tps:.2}")),
        record.total_tokens,
        record.duration_seconds
    );
    println!("Results saved to {}", output.display());
}

/// @ai:intent Print a templated prompt
/// @ai:effects io
fn print_template(model: &str, prompt: Option<String>) -> Result<()> {
    let registry = TemplateRegistry::builtin();
    let prompt = prompt.unwrap_or_else(|| rkllm_bench::config::DEFAULT_PROMPT.to_string());

    match registry.rule_for(model) {
        Some(rule) => tracing::info!("Using {} chat template", rule.name),
        None => tracing::info!("No chat template for {}; prompt unchanged", model),
    }
    println!("{}", registry.apply(model, &prompt));
    Ok(())
}

/// @ai:intent Summarise a benchmark log
/// @ai:effects fs:read, io
fn summarize(input: &Path, json: bool) -> Result<()> {
    let reader = ReportReader::new();
    let summaries = reader.summarize(input)?;

    if json {
        println!("{}", reader.render_json(&summaries)?);
    } else if summaries.is_empty() {
        println!("No runs recorded in {}", input.display());
    } else {
        print!("{}", reader.render_table(&summaries));
    }
    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = BenchmarkConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<BenchmarkConfig> {
    match path {
        Some(p) => Ok(BenchmarkConfig::load(&p)?),
        None => {
            let default_path = PathBuf::from("benchmark.toml");

            if default_path.exists() {
                Ok(BenchmarkConfig::load(&default_path)?)
            } else {
                Ok(BenchmarkConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_marks_precondition_failures() {
        let err = explain(Error::ModelNotFound {
            path: PathBuf::from("absent.rkllm"),
        });
        assert_eq!(err.to_string(), "Benchmark cannot start");
        assert!(format!("{:#}", err).contains("absent.rkllm"));
    }

    #[test]
    fn test_explain_passes_other_errors_through() {
        let err = explain(Error::InvalidReport("bad".to_string()));
        assert_eq!(err.to_string(), "Invalid generation report: bad");
    }
}
