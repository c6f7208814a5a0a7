mod cli;
mod config;
mod dispatch;
mod error;
mod gemini;
mod job;
mod rotation;
mod ui;
mod worklist;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;

use cli::{Cli, Command, PlanArgs, RunArgs};
use config::BatchConfig;
use dispatch::{DispatchOptions, Dispatcher};
use error::BatchError;
use gemini::VertexClient;
use rotation::Endpoint;
use ui::BatchProgress;

const EXIT_OK: i32 = 0;
// A fatal error before any job was dispatched.
const EXIT_FATAL: i32 = 1;
// The batch ran to completion but some jobs failed.
const EXIT_FAILURES: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!(
                "{}",
                console::Style::new()
                    .red()
                    .bold()
                    .apply_to(format!("Error: {err:#}"))
            );
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}

async fn execute(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run(args) => run_batch(args, cli.verbose).await,
        Command::Plan(args) => plan_batch(args).await,
    }
}

async fn run_batch(args: RunArgs, verbose: bool) -> Result<i32> {
    let mut config = BatchConfig::load()?;
    config.apply_run_args(&args);
    config.validate()?;

    if verbose {
        println!(
            "model={} project={} workers={} interval={:?} timeout={:?} regions={}",
            config.model,
            config.project_id,
            config.workers,
            config.admission_interval(),
            config.job_timeout(),
            config.regions.len()
        );
    }
    println!("Using max output tokens: {}", config.max_output_tokens);

    let units = worklist::enumerate(&config.input_dir, &config.output_dir)?;
    if units.is_empty() {
        println!(
            "No {} files found in the input directory: {}",
            worklist::PROMPT_SUFFIX,
            config.input_dir.display()
        );
    }

    std::fs::create_dir_all(&config.output_dir).map_err(|source| BatchError::OutputDir {
        dir: config.output_dir.display().to_string(),
        source,
    })?;

    let endpoints: Vec<Endpoint<VertexClient>> = config
        .regions
        .iter()
        .map(|region| Endpoint {
            label: region.clone(),
            client: Arc::new(VertexClient::new(
                &config.project_id,
                region,
                &config.model,
                &config.access_token,
            )),
        })
        .collect();

    // Ctrl-C stops new admissions and cancels in-flight jobs; the run still
    // drains every admitted job before printing the summary.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let options = DispatchOptions {
        workers: config.workers,
        interval: config.admission_interval(),
        job_timeout: config.job_timeout(),
        fail_limit: config.fail_limit,
        fail_on_empty: config.fail_on_empty,
        params: config.generation_params(),
    };
    let progress = BatchProgress::start(units.len() as u64);
    let outcome = Dispatcher::new(endpoints, options, progress, shutdown_rx)
        .run(units)
        .await;

    Ok(if outcome.is_clean() {
        EXIT_OK
    } else {
        EXIT_FAILURES
    })
}

async fn plan_batch(args: PlanArgs) -> Result<i32> {
    let mut config = BatchConfig::load()?;
    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if config.input_dir.as_os_str().is_empty() {
        return Err(BatchError::Config(
            "input directory not set (use --input-dir or INPUT_DIR)".into(),
        )
        .into());
    }
    if config.output_dir.as_os_str().is_empty() {
        return Err(BatchError::Config(
            "output directory not set (use --output-dir or OUTPUT_DIR)".into(),
        )
        .into());
    }

    let units = worklist::enumerate(&config.input_dir, &config.output_dir)?;
    let mut claims = worklist::Claims::default();
    let mut to_process = 0usize;
    let mut done = 0usize;
    let mut duplicates = 0usize;
    for unit in &units {
        match claims.plan(unit) {
            worklist::Admission::Admit => {
                to_process += 1;
                println!("process  {} -> {}", unit.name, unit.target.display());
            }
            worklist::Admission::SkipDone => {
                done += 1;
                println!("skip     {} (already exists)", unit.target.display());
            }
            worklist::Admission::SkipDuplicate => {
                duplicates += 1;
                println!("skip     {} (duplicate target)", unit.target.display());
            }
        }
    }
    println!(
        "{to_process} to process, {done} already done, {duplicates} duplicates, {} total",
        units.len()
    );
    Ok(EXIT_OK)
}
