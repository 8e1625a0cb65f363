//! CLI entry point of the scheduler.
//!
//! Loads the pipeline, resource catalog, network table, and dry-run
//! metrics from CSV files, runs the candidate-schedule search, and
//! serializes the produced timelines.
//!
//! Exit codes: 0 when at least one timeline is produced; 2 when the
//! search is infeasible under the deadline or budget; 3 on malformed
//! input; 4 when a required (step, resource) pair has no dry-run
//! coverage.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cats::error::{InfeasibleReason, InputError, ScheduleError};
use cats::estimator::EstimatorConfig;
use cats::io;
use cats::models::{DryRunData, NetworkGraph, Pipeline};
use cats::scheduler::{SchedulerConfig, TimelineScheduler};
use cats::validation::{validate_config, validate_inputs};

const EXIT_INTERNAL: u8 = 1;
const EXIT_INFEASIBLE: u8 = 2;
const EXIT_MALFORMED: u8 = 3;
const EXIT_SAMPLE_GAP: u8 = 4;

/// Context-aware timeline scheduler for pipelines on the compute
/// continuum.
#[derive(Debug, Parser)]
#[command(name = "cats", version, about)]
struct Cli {
    /// Pipeline descriptor CSV (step, prerequisite, kind, scalable).
    #[arg(long)]
    pipeline: PathBuf,

    /// Resource catalog CSV (name, cpu_cores, memory_bytes,
    /// cost_per_second).
    #[arg(long)]
    resources: PathBuf,

    /// Pairwise network CSV (source, target, bandwidth_bytes_per_sec,
    /// latency_ms, cost_per_gb).
    #[arg(long)]
    network: PathBuf,

    /// Dry-run step metrics CSV.
    #[arg(long)]
    step_metrics: PathBuf,

    /// Dry-run performance metrics CSV.
    #[arg(long)]
    performance_metrics: PathBuf,

    /// Dry-run deployment metrics CSV.
    #[arg(long)]
    deployment_metrics: PathBuf,

    /// Deadline in seconds.
    #[arg(long)]
    deadline_seconds: f64,

    /// Budget in USD.
    #[arg(long)]
    budget_usd: f64,

    /// Pipeline input volume in megabytes.
    #[arg(long)]
    input_volume_mb: f64,

    /// Cap on replicas per scalable step (1 disables replication).
    #[arg(long)]
    max_scalability: Option<u32>,

    /// Pin a step to a resource; repeatable.
    #[arg(long = "force", value_name = "STEP=RESOURCE")]
    forced: Vec<String>,

    /// Worker threads for the search (defaults to the CPU count).
    #[arg(long)]
    workers: Option<usize>,

    /// Wall-clock budget for the search in seconds.
    #[arg(long)]
    search_timeout_secs: Option<u64>,

    /// Safety factor on estimated CPU reservations.
    #[arg(long, default_value_t = 1.0)]
    cpu_headroom: f64,

    /// Safety factor on estimated memory reservations.
    #[arg(long, default_value_t = 1.0)]
    memory_headroom: f64,

    /// Directory for the produced timeline CSVs (stdout when omitted).
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    run(Cli::parse())
}

fn run(cli: Cli) -> ExitCode {
    let (pipeline, graph, dry_runs) = match load_inputs(&cli) {
        Ok(loaded) => loaded,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(EXIT_MALFORMED);
        }
    };

    if let Err(errors) = validate_inputs(&pipeline, &graph, &dry_runs) {
        for e in &errors {
            error!("{}", e.message);
        }
        return ExitCode::from(EXIT_MALFORMED);
    }

    let config = match build_config(&cli, &pipeline, &graph) {
        Ok(config) => config,
        Err(message) => {
            error!("{message}");
            return ExitCode::from(EXIT_MALFORMED);
        }
    };
    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            error!("{}", e.message);
        }
        return ExitCode::from(EXIT_MALFORMED);
    }

    let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);
    let timelines = match scheduler.schedule() {
        Ok(timelines) => timelines,
        Err(ScheduleError::Infeasible { reason }) => {
            error!("no feasible timeline: {reason}");
            return match reason {
                InfeasibleReason::InsufficientSamples => ExitCode::from(EXIT_SAMPLE_GAP),
                _ => ExitCode::from(EXIT_INFEASIBLE),
            };
        }
        Err(err) => {
            error!("scheduling failed: {err}");
            return ExitCode::from(EXIT_INTERNAL);
        }
    };

    info!(timelines = timelines.len(), "schedule complete");
    for (index, timeline) in timelines.iter().enumerate() {
        let summary = scheduler.summarize(timeline);
        println!("timeline {index}: {summary}");
        if let Err(err) = emit_timeline(&cli, index, timeline, &pipeline, &graph) {
            error!("{err}");
            return ExitCode::from(EXIT_INTERNAL);
        }
    }
    ExitCode::SUCCESS
}

fn open(path: &Path) -> Result<File, InputError> {
    File::open(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn origin(path: &Path) -> String {
    path.display().to_string()
}

fn load_inputs(cli: &Cli) -> Result<(Pipeline, NetworkGraph, DryRunData), InputError> {
    let pipeline = io::load_pipeline(open(&cli.pipeline)?, &origin(&cli.pipeline))?;
    let mut graph = io::load_resources(open(&cli.resources)?, &origin(&cli.resources))?;
    io::load_network(open(&cli.network)?, &origin(&cli.network), &mut graph)?;

    let mut dry_runs = DryRunData::new();
    io::load_step_metrics(
        open(&cli.step_metrics)?,
        &origin(&cli.step_metrics),
        &pipeline,
        &graph,
        &mut dry_runs,
    )?;
    io::load_performance_metrics(
        open(&cli.performance_metrics)?,
        &origin(&cli.performance_metrics),
        &pipeline,
        &graph,
        &mut dry_runs,
    )?;
    io::load_deployment_metrics(
        open(&cli.deployment_metrics)?,
        &origin(&cli.deployment_metrics),
        &pipeline,
        &graph,
        &mut dry_runs,
    )?;
    Ok((pipeline, graph, dry_runs))
}

fn build_config(
    cli: &Cli,
    pipeline: &Pipeline,
    graph: &NetworkGraph,
) -> Result<SchedulerConfig, String> {
    let mut config =
        SchedulerConfig::new(cli.deadline_seconds, cli.budget_usd, cli.input_volume_mb)
            .with_estimator(EstimatorConfig {
                cpu_headroom: cli.cpu_headroom,
                memory_headroom: cli.memory_headroom,
            });

    if let Some(max) = cli.max_scalability {
        config = config.with_max_scalability(max);
    }
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    if let Some(secs) = cli.search_timeout_secs {
        config = config.with_search_timeout(std::time::Duration::from_secs(secs));
    }

    for pin in &cli.forced {
        let (step_name, resource_name) = pin
            .split_once('=')
            .ok_or_else(|| format!("invalid --force '{pin}', expected STEP=RESOURCE"))?;
        let step = pipeline
            .step_id(step_name.trim())
            .ok_or_else(|| format!("--force references unknown step '{step_name}'"))?;
        let resource = graph
            .resource_id(resource_name.trim())
            .ok_or_else(|| format!("--force references unknown resource '{resource_name}'"))?;
        config = config.with_forced_deployment(step, resource);
    }

    Ok(config)
}

fn emit_timeline(
    cli: &Cli,
    index: usize,
    timeline: &cats::Timeline,
    pipeline: &Pipeline,
    graph: &NetworkGraph,
) -> Result<(), InputError> {
    match &cli.output {
        Some(dir) => {
            let path = dir.join(format!("timeline-{index}.csv"));
            let file = File::create(&path).map_err(|source| InputError::Io {
                path: path.display().to_string(),
                source,
            })?;
            io::write_timeline(file, &origin(&path), timeline, pipeline, graph)
        }
        None => io::write_timeline(
            std::io::stdout().lock(),
            "<stdout>",
            timeline,
            pipeline,
            graph,
        ),
    }
}
