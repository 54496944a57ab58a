//! Build command - run a build, reusing cached layers

use crate::build::{self, BuildOutcome, CancelFlag};
use crate::cli::args::BuildArgs;
use crate::cli::commands::{load_layers, open_index, truncate};
use crate::config::Config;
use crate::error::StrataResult;
use crate::executor::{Executor, ShellExecutor};
use crate::journal::BuildJournal;
use crate::layer::LayerDescriptor;
use crate::planner;
use console::style;
use tracing::{debug, warn};

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> StrataResult<()> {
    let (build_file, layers) = load_layers(&args.file).await?;
    let index = open_index(config)?;
    let executor = ShellExecutor::from_config(&config.executor, build_file.context_dir());
    let journal = BuildJournal::new(config);

    let plan = planner::plan(&layers, &index);
    println!(
        "Building {} layer(s) with {} executor ({} cached)",
        plan.steps.len(),
        executor.executor_name(),
        plan.reuse_count()
    );

    let cancel = CancelFlag::new();
    watch_ctrl_c(cancel.clone());

    match build::execute_plan(plan, &index, &executor, &cancel).await {
        Ok(outcome) => {
            print_outcome(&layers, &outcome);
            journal.completed(&args.file, &outcome).await;
            Ok(())
        }
        Err(e) => {
            journal.failed(&args.file, &e).await;
            Err(e)
        }
    }
}

/// Request cancellation on Ctrl-C; the running layer is allowed to finish
fn watch_ctrl_c(cancel: CancelFlag) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!(
                    "{} stopping after the current layer",
                    style("Interrupted:").yellow()
                );
                cancel.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}

fn print_outcome(layers: &[LayerDescriptor], outcome: &BuildOutcome) {
    for result in &outcome.layers {
        let instruction = layers
            .iter()
            .find(|l| l.position() == result.position)
            .map(|l| truncate(l.instruction(), 48))
            .unwrap_or_default();

        let marker = if result.reused {
            style("cached").dim()
        } else {
            style("built ").green()
        };

        println!(
            "  {} [{}] {} {}",
            marker,
            result.position,
            style(result.key.digest().short()).dim(),
            instruction
        );
        debug!("Layer {} content: {}", result.position, result.content);
    }

    println!();
    println!(
        "{} {} executed, {} reused",
        style("✓").green(),
        outcome.executed_count(),
        outcome.reused_count()
    );
}
