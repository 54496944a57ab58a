//! Plan command - dry-run a build

use crate::cli::args::{OutputFormat, PlanArgs};
use crate::cli::commands::{load_layers, open_index, truncate};
use crate::config::Config;
use crate::error::StrataResult;
use crate::planner::{self, BuildPlan, Decision};
use console::style;

/// Execute the plan command
pub async fn execute(args: PlanArgs, config: &Config) -> StrataResult<()> {
    let (_, layers) = load_layers(&args.file).await?;
    let index = open_index(config)?;

    let plan = planner::plan(&layers, &index);

    match args.format {
        OutputFormat::Table => print_plan_table(&plan),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Plain => print_plan_plain(&plan),
    }

    Ok(())
}

fn print_plan_table(plan: &BuildPlan) {
    if plan.is_empty() {
        println!("No layers declared.");
        return;
    }

    println!(
        "{:<6} {:<10} {:<14} {}",
        "POS", "DECISION", "KEY", "INSTRUCTION"
    );
    println!("{}", "-".repeat(80));

    for step in &plan.steps {
        let decision = match step.decision {
            Decision::Reuse { .. } => style("reuse").green().to_string(),
            Decision::Execute => style("execute").yellow().to_string(),
        };

        println!(
            "{:<6} {:<10} {:<14} {}",
            step.layer.position(),
            decision,
            step.key.digest().short(),
            truncate(step.layer.instruction(), 48)
        );
    }

    println!();
    println!("{}", summary_line(plan));
}

fn print_plan_plain(plan: &BuildPlan) {
    for step in &plan.steps {
        println!(
            "{} {} {}",
            step.layer.position(),
            step.decision,
            step.key.digest()
        );
    }
}

fn summary_line(plan: &BuildPlan) -> String {
    format!(
        "{} layer(s): {} reuse, {} execute ({:.0}% cached)",
        plan.steps.len(),
        plan.reuse_count(),
        plan.execute_count(),
        plan.hit_ratio() * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheIndex, ContentRef, MemoryIndex};
    use crate::layer::LayerDescriptor;

    #[test]
    fn summary_reports_ratio() {
        let layers = vec![
            LayerDescriptor::new(1, "install-deps", vec![]),
            LayerDescriptor::new(2, "copy-source", vec![]),
        ];
        let index = MemoryIndex::new();
        let keys = planner::chain_keys(&layers);
        index.store(&keys[0], ContentRef::new("deps")).unwrap();

        let plan = planner::plan(&layers, &index);
        assert_eq!(
            summary_line(&plan),
            "2 layer(s): 1 reuse, 1 execute (50% cached)"
        );
    }
}
