//! CLI for specloop.
//!
//! Turns prompts into design specifications, scores them and repairs them
//! iteratively. Every command reads JSON (or a raw prompt) and writes JSON to
//! stdout; diagnostics go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use specloop_core::{
    assess, parse_prompt, request::check_prompt_len, DomainTables, IterateRequest, Scorer,
    Specification, DEFAULT_MAX_ITERS, DEFAULT_MAX_PROMPT_LEN,
};
use specloop_extract::FieldExtractor;
use specloop_feedback::{IterationController, ObjectiveOptimizer};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod report;
mod telemetry;

use report::{ReportEntry, ReportIds};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Alternate domain tables (JSON)
    #[arg(long, global = true, env = "SPECLOOP_TABLES")]
    tables: Option<PathBuf>,

    /// Emit log lines as JSON (filter via SPECLOOP_LOG)
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a specification from a prompt
    Generate {
        /// Prompt text; without it a `{"prompt": ...}` payload is read
        #[arg(long)]
        prompt: Option<String>,

        /// Payload file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Maximum prompt length in characters
        #[arg(long, env = "SPECLOOP_MAX_PROMPT_LEN", default_value_t = DEFAULT_MAX_PROMPT_LEN)]
        max_prompt_len: usize,
    },
    /// Score a specification (or one per line with --batch)
    Evaluate {
        /// Specification file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Treat the input as JSON lines, one specification per line
        #[arg(long)]
        batch: bool,

        /// Append `{ts, spec, evaluation, score}` lines to this file
        #[arg(long, env = "SPECLOOP_REPORT_LOG")]
        report_log: Option<PathBuf>,
    },
    /// Repair a specification until it converges or the budget runs out
    Iterate {
        /// `{"spec": ..., "max_iters": n}` payload file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Iteration budget; overrides the payload's `max_iters` when given
        #[arg(long, env = "SPECLOOP_MAX_ITERS", allow_negative_numbers = true)]
        max_iters: Option<i64>,
    },
    /// Raise the weakest quality objective until the weighted total stalls
    Optimize {
        /// `{"spec": ..., "max_iters": n}` payload file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Round budget; overrides the payload's `max_iters` when given
        #[arg(long, env = "SPECLOOP_MAX_ITERS", allow_negative_numbers = true)]
        max_iters: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_json);

    let tables = load_tables(cli.tables.as_deref())?;
    let output = match cli.command {
        Commands::Generate {
            prompt,
            input,
            max_prompt_len,
        } => generate(&tables, prompt, input.as_deref(), max_prompt_len)?,
        Commands::Evaluate {
            input,
            batch,
            report_log,
        } => evaluate(&tables, input.as_deref(), batch, report_log.as_deref())?,
        Commands::Iterate { input, max_iters } => {
            iterate(&tables, input.as_deref(), max_iters)?
        }
        Commands::Optimize { input, max_iters } => {
            optimize(&tables, input.as_deref(), max_iters)?
        }
    };

    for value in output {
        println!("{}", serde_json::to_string(&value)?);
    }
    Ok(())
}

fn load_tables(path: Option<&Path>) -> Result<Arc<DomainTables>> {
    match path {
        Some(path) => {
            let tables = DomainTables::from_path(path)
                .with_context(|| format!("Failed to load tables from {}", path.display()))?;
            tracing::info!(path = %path.display(), "loaded alternate domain tables");
            Ok(Arc::new(tables))
        }
        None => Ok(DomainTables::shared()),
    }
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(p) if p != Path::new("-") => Box::new(BufReader::new(
            File::open(p).with_context(|| format!("Failed to open {}", p.display()))?,
        )),
        _ => Box::new(BufReader::new(io::stdin())),
    })
}

fn read_json(path: Option<&Path>) -> Result<Value> {
    let mut raw = String::new();
    open_input(path)?
        .read_to_string(&mut raw)
        .context("Failed to read input")?;
    serde_json::from_str(&raw).context("Input is not valid JSON")
}

fn generate(
    tables: &Arc<DomainTables>,
    prompt: Option<String>,
    input: Option<&Path>,
    max_prompt_len: usize,
) -> Result<Vec<Value>> {
    let prompt = match prompt {
        Some(prompt) => {
            check_prompt_len(&prompt, max_prompt_len)?;
            prompt
        }
        None => parse_prompt(&read_json(input)?, max_prompt_len)?,
    };
    let spec = FieldExtractor::new(Arc::clone(tables)).extract(&prompt);
    Ok(vec![serde_json::to_value(spec)?])
}

fn evaluate(
    tables: &Arc<DomainTables>,
    input: Option<&Path>,
    batch: bool,
    report_log: Option<&Path>,
) -> Result<Vec<Value>> {
    let specs = if batch {
        read_batch(input)?
    } else {
        vec![Specification::from_value(read_json(input)?)?]
    };

    let scorer = Scorer::new(Arc::clone(tables));
    let mut output = Vec::with_capacity(specs.len());
    let mut entries = Vec::with_capacity(specs.len());
    for (spec, report_id) in specs.into_iter().zip(ReportIds::starting_now()) {
        let evaluation = scorer.score(&spec);
        let assessment = assess(evaluation.spec_score);
        output.push(json!({
            "report_id": report_id,
            "score": evaluation.spec_score,
            "assessment": assessment,
            "summary": assessment.summary(),
            "evaluation": evaluation,
        }));
        entries.push(ReportEntry::new(report_id, spec, evaluation));
    }

    if let Some(path) = report_log {
        let written = report::append(path, &entries)?;
        tracing::info!(path = %path.display(), written, "evaluations logged");
    }
    Ok(output)
}

/// Parses one specification per non-blank line; the first bad line aborts.
fn read_batch(input: Option<&Path>) -> Result<Vec<Specification>> {
    let mut specs = Vec::new();
    for (idx, line) in open_input(input)?.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("line {line_no}: not valid JSON"))?;
        let spec = Specification::from_value(value).with_context(|| format!("line {line_no}"))?;
        specs.push(spec);
    }
    Ok(specs)
}

/// Reads an iterate-style payload; a `--max-iters` flag wins over the payload.
fn read_request(input: Option<&Path>, max_iters: Option<i64>) -> Result<IterateRequest> {
    let mut request = IterateRequest::from_value(read_json(input)?, DEFAULT_MAX_ITERS)?;
    if let Some(n) = max_iters {
        request.max_iters = usize::try_from(n.max(0)).unwrap_or(usize::MAX);
    }
    Ok(request)
}

fn iterate(
    tables: &Arc<DomainTables>,
    input: Option<&Path>,
    max_iters: Option<i64>,
) -> Result<Vec<Value>> {
    let request = read_request(input, max_iters)?;
    let controller = IterationController::with_tables(Arc::clone(tables));
    let run = controller.iterate(&request.spec, request.max_iters);
    Ok(vec![json!({
        "iterations": run.history.len(),
        "improvements": run.improvements(),
        "converged": run.converged,
        "history": run.history,
        "final_spec": run.final_spec,
    })])
}

fn optimize(
    tables: &Arc<DomainTables>,
    input: Option<&Path>,
    max_iters: Option<i64>,
) -> Result<Vec<Value>> {
    let request = read_request(input, max_iters)?;
    let optimizer = ObjectiveOptimizer::with_tables(Arc::clone(tables));
    let run = optimizer.optimize(&request.spec, request.max_iters);
    Ok(vec![json!({
        "iterations": run.history.len(),
        "final_objectives": run.final_objectives,
        "final_total": run.final_total,
        "history": run.history,
        "final_spec": run.final_spec,
    })])
}
