//! goaltrace CLI: evaluate process traces against i* goal models.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use goaltrace::description::load_model;
use goaltrace::status::StatusSnapshot;
use goaltrace::trace::{Trace, TraceConfig, TraceReport, evaluate_trace, evaluate_traces};

#[derive(Parser)]
#[command(
    name = "goaltrace",
    version,
    about = "Evaluate process traces against i* goal models"
)]
struct Cli {
    /// Log rule firings and propagation steps.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a model description and print a summary.
    Check {
        /// Model description (.toml or .json).
        #[arg(long)]
        model: PathBuf,
    },

    /// Evaluate a single trace.
    Run {
        /// Model description (.toml or .json).
        #[arg(long)]
        model: PathBuf,

        /// Comma-separated event ids, e.g. "e6,e7,e8".
        #[arg(long, conflicts_with = "trace_file")]
        trace: Option<String>,

        /// File holding the trace (one event per line or comma separated).
        #[arg(long)]
        trace_file: Option<PathBuf>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Skip per-event status snapshots.
        #[arg(long)]
        no_snapshots: bool,
    },

    /// Evaluate many traces, each against a fresh model state.
    Batch {
        /// Model description (.toml or .json).
        #[arg(long)]
        model: PathBuf,

        /// Trace file: JSON array(s) of event ids, or one trace per line.
        #[arg(long)]
        traces: PathBuf,

        /// Print the reports as JSON.
        #[arg(long)]
        json: bool,

        /// Evaluate traces one after another instead of in parallel.
        #[arg(long)]
        sequential: bool,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { model } => {
            let model = load_model(&model)?;
            println!("{}", model.info());
        }

        Commands::Run {
            model,
            trace,
            trace_file,
            json,
            no_snapshots,
        } => {
            let model = Arc::new(load_model(&model)?);
            let trace = match (trace, trace_file) {
                (Some(events), _) => Trace::parse_text(&events),
                (None, Some(path)) => {
                    let content = std::fs::read_to_string(&path).into_diagnostic()?;
                    Trace::parse_text(&content)
                }
                (None, None) => miette::bail!("provide a trace with --trace or --trace-file"),
            };

            let config = TraceConfig {
                record_snapshots: !no_snapshots,
                ..Default::default()
            };
            let report = evaluate_trace(&model, &trace, &config);

            if json {
                let out = serde_json::to_string_pretty(&report).into_diagnostic()?;
                println!("{out}");
            } else {
                print_report(&report);
            }
        }

        Commands::Batch {
            model,
            traces,
            json,
            sequential,
        } => {
            let model = Arc::new(load_model(&model)?);
            let traces = Trace::load(&traces)?;
            let config = TraceConfig {
                record_snapshots: false,
                parallel: !sequential,
            };
            let reports = evaluate_traces(&model, &traces, &config);

            if json {
                let out = serde_json::to_string_pretty(&reports).into_diagnostic()?;
                println!("{out}");
            } else {
                for (i, report) in reports.iter().enumerate() {
                    let label = report.label.as_deref().unwrap_or("");
                    println!(
                        "trace #{} {}: {} events, {} rule firings",
                        i + 1,
                        label,
                        report.steps.len(),
                        report.firing_count()
                    );
                    print_unmapped(report);
                    print_snapshot(&report.final_status, "  ");
                }
            }
        }
    }

    Ok(())
}

fn print_report(report: &TraceReport) {
    for step in &report.steps {
        println!("event {}: {}", step.index + 1, step.event);
        if !step.mapped {
            println!("  (no mapping)");
        }
        for firing in &step.firings {
            let status = step
                .snapshot
                .as_ref()
                .and_then(|s| s.status(&firing.element))
                .map(|s| format!(" -> {s}"))
                .unwrap_or_default();
            println!("  {} [{}]{}", firing.element, firing.rule, status);
        }
    }
    println!("final status:");
    print_snapshot(&report.final_status, "  ");
}

fn print_unmapped(report: &TraceReport) {
    let unmapped = report.unmapped_events();
    if !unmapped.is_empty() {
        println!("  unmapped events: {}", unmapped.join(", "));
    }
}

fn print_snapshot(snapshot: &StatusSnapshot, indent: &str) {
    for (id, status) in &snapshot.tasks {
        println!("{indent}task    {id}: {status}");
    }
    for (id, status) in &snapshot.goals {
        println!("{indent}goal    {id}: {status}");
    }
    for (id, status) in &snapshot.qualities {
        println!("{indent}quality {id}: {status}");
    }
}
