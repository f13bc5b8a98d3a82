//! Model Explorer CLI Module
//!
//! Command-line interface for the interactive dashboard, one-shot runs and
//! dataset/registry inspection.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ExplorerConfig;
use crate::dashboard::{
    accent, dim, muted, ok, section, BufferSurface, Controls, Dashboard, PresetControls,
    Selections, TerminalControls, TerminalSurface,
};
use crate::preprocessing::ScalingScope;
use crate::training::ModelKind;

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "model-explorer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explore classical classifiers on a tabular dataset")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Dataset to explore (overrides the configuration file)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline once with preset choices
    Run {
        /// Input data file
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Target column name
        #[arg(short, long)]
        target: Option<String>,

        /// Proportion of rows held back for testing (0.05 to 0.95, step 0.05)
        #[arg(long)]
        test_size: Option<f64>,

        /// Model name, e.g. "decision trees"
        #[arg(short, long)]
        model: Option<String>,

        /// Hyperparameter as key=value; repeatable
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Scaling scope (features, full-frame, disabled)
        #[arg(long)]
        scaling: Option<String>,

        /// Seed of the train/test shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Print the evaluation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show data information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// List the models and their hyperparameter controls
    Models,
}

// ─── Configuration ─────────────────────────────────────────────────────────────

/// Read the configuration file if one was given, then apply the data override
pub fn resolve_config(
    config_path: Option<&Path>,
    data: Option<&Path>,
) -> anyhow::Result<ExplorerConfig> {
    let mut config = match config_path {
        Some(path) => ExplorerConfig::from_file(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(data) = data {
        config = config.with_data_path(data);
    }
    Ok(config)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Arguments of the `run` subcommand, already merged with `--data`
pub struct RunArgs {
    pub target: Option<String>,
    pub test_size: Option<f64>,
    pub model: Option<String>,
    pub params: Vec<String>,
    pub scaling: Option<String>,
    pub seed: Option<u64>,
    pub json: bool,
}

pub fn cmd_run(mut config: ExplorerConfig, args: RunArgs) -> anyhow::Result<()> {
    if let Some(target) = args.target {
        config = config.with_target(target);
    }
    if let Some(test_size) = args.test_size {
        config = config.with_test_size(test_size);
    }
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(scaling) = args.scaling {
        config = config.with_scaling(scaling.parse::<ScalingScope>()?);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut controls = config.preset_controls();
    controls.merge(PresetControls::from_assignments(&args.params)?);

    let dashboard = Dashboard::new(config);
    let start = Instant::now();
    let dataset = dashboard.load()?;
    let selections = Selections::gather(&dataset, &mut controls)?;
    controls.finish()?;

    if args.json {
        let mut surface = BufferSurface::new();
        let outcome = dashboard.run_once(&selections, &mut surface)?;
        println!("{}", serde_json::to_string_pretty(&outcome.evaluation)?);
        return Ok(());
    }

    let mut surface = TerminalSurface::new();
    let outcome = dashboard.run_once(&selections, &mut surface)?;

    println!();
    println!(
        "  {} {} {}",
        ok("✓"),
        outcome.evaluation.model.white().bold(),
        dim(&format!(
            "{} train / {} test rows in {:.2?}",
            outcome.evaluation.n_train,
            outcome.evaluation.n_test,
            start.elapsed()
        ))
    );
    println!();
    Ok(())
}

pub fn cmd_info(config: ExplorerConfig) -> anyhow::Result<()> {
    section("Data Info");

    let dashboard = Dashboard::new(config);
    let dataset = dashboard.load()?;
    let config = dashboard.config();

    println!("  {:<12} {}", muted("File"), config.data_path.display());
    println!("  {:<12} {}", muted("Rows"), dataset.height());
    println!("  {:<12} {}", muted("Columns"), dataset.width());
    println!();

    println!(
        "  {:<20} {:<12} {:>6} {:>8}",
        muted("Column"),
        muted("Type"),
        muted("Nulls"),
        muted("Unique")
    );
    println!("  {}", dim(&"─".repeat(50)));

    for summary in dataset.column_summaries() {
        println!(
            "  {:<20} {:<12} {:>6} {:>8}",
            summary.name,
            summary.dtype.truecolor(140, 140, 140),
            summary.null_count,
            summary.n_unique
        );
    }

    println!();
    Ok(())
}

pub fn cmd_models() -> anyhow::Result<()> {
    section("Models");

    for name in ModelKind::option_names() {
        let kind = ModelKind::from_name(&name)?;
        println!("  {}", accent(&name).bold());
        let specs = kind.param_specs();
        if specs.is_empty() {
            println!("    {}", dim("no hyperparameters"));
        }
        for spec in specs {
            println!(
                "    {:<14} {}",
                spec.name.white(),
                muted(&spec.control.to_string())
            );
        }
        println!();
    }

    Ok(())
}

// ─── Interactive mode ──────────────────────────────────────────────────────────

fn print_banner(config: &ExplorerConfig) {
    println!();
    println!("       {}", "Model Exploration".truecolor(120, 170, 255).bold());
    println!(
        "       {}",
        dim(&format!(
            "{}  ·  v{}",
            config.data_path.display(),
            env!("CARGO_PKG_VERSION")
        ))
    );
    println!();
}

pub fn cmd_interactive(config: ExplorerConfig) -> anyhow::Result<()> {
    print_banner(&config);

    let mut controls = TerminalControls::with_presets(config.preset_controls());
    let dashboard = Dashboard::new(config);
    let mut surface = TerminalSurface::new();
    dashboard.interactive(&mut controls, &mut surface)?;

    println!();
    println!("  {}", dim("goodbye"));
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "model-explorer",
            "run",
            "--data",
            "listings.csv",
            "--target",
            "room_type",
            "--model",
            "decision trees",
            "--param",
            "max_depth=3",
            "--param",
            "criterion=gini",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Run { data, target, params, json, .. }) => {
                assert_eq!(data, Some(PathBuf::from("listings.csv")));
                assert_eq!(target.as_deref(), Some("room_type"));
                assert_eq!(params, vec!["max_depth=3", "criterion=gini"]);
                assert!(json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_defaults_to_interactive() {
        let cli = Cli::try_parse_from(["model-explorer"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.data.is_none());
    }

    #[test]
    fn test_resolve_config_data_override() {
        let config = resolve_config(None, Some(Path::new("other.csv"))).unwrap();
        assert_eq!(config.data_path, PathBuf::from("other.csv"));
    }
}
