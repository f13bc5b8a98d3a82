//! Interactive dashboard
//!
//! Gathers a run's configuration from a set of [`Controls`], re-runs the
//! whole pipeline for every change and renders the outcome on a
//! [`Surface`].

mod controls;
mod surface;
mod terminal;

pub use controls::{float_steps, int_steps, is_control_key, Controls, PresetControls};
pub use surface::{BufferSurface, Surface, SurfaceItem};
pub use terminal::{TerminalControls, TerminalSurface};

pub(crate) use controls::round_to;
use controls::{MENU_KEY, MODEL_KEY, TARGET_KEY, TEST_SIZE_KEY};
pub(crate) use terminal::{accent, dim, muted, ok, section};

use crate::config::{ExplorerConfig, RunConfig, DEFAULT_TEST_PROPORTION};
use crate::error::{ExplorerError, Result};
use crate::pipeline::{Pipeline, RunOutcome};
use crate::training::{Estimator, ModelKind, ModelParams};
use crate::utils::{DataLoader, Dataset};
use tracing::{info, warn};

const TEST_SIZE_MIN: f64 = 0.05;
const TEST_SIZE_MAX: f64 = 0.95;
const TEST_SIZE_STEP: f64 = 0.05;

/// The user's choices for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Selections {
    pub target: String,
    pub test_proportion: f64,
    pub params: ModelParams,
}

impl Selections {
    /// Ask for every choice in dashboard order: target, test proportion,
    /// model, then the model's hyperparameters.
    ///
    /// Leaves [`Controls::finish`] to the caller, once the session is over.
    pub fn gather(dataset: &Dataset, controls: &mut dyn Controls) -> Result<Self> {
        let target = ask_target(dataset, controls)?;
        let test_proportion = ask_test_size(controls)?;
        let params = ask_model(controls)?;
        Ok(Self {
            target,
            test_proportion,
            params,
        })
    }

    pub fn run_config(&self, config: &ExplorerConfig) -> RunConfig {
        RunConfig::new(self.target.clone(), self.params.clone())
            .with_test_proportion(self.test_proportion)
            .with_seed(config.seed)
            .with_scaling(config.scaling)
    }
}

fn ask_target(dataset: &Dataset, controls: &mut dyn Controls) -> Result<String> {
    let columns = dataset.sorted_column_names();
    if columns.is_empty() {
        return Err(ExplorerError::DataLoad("dataset has no columns".to_string()));
    }
    let idx = controls.select(
        TARGET_KEY,
        "Select the target column from input data:",
        &columns,
        0,
    )?;
    Ok(columns[idx].clone())
}

fn ask_test_size(controls: &mut dyn Controls) -> Result<f64> {
    let value = controls.slider_float(
        TEST_SIZE_KEY,
        "Proportion of data to hold back for testing:",
        TEST_SIZE_MIN,
        TEST_SIZE_MAX,
        TEST_SIZE_STEP,
        DEFAULT_TEST_PROPORTION,
    )?;
    Ok(round_to(value, 2))
}

fn ask_model(controls: &mut dyn Controls) -> Result<ModelParams> {
    let names = ModelKind::option_names();
    let idx = controls.select(MODEL_KEY, "Choose ML model to apply:", &names, 0)?;
    ModelKind::from_name(&names[idx])?.collect_params(controls)
}

fn rendered(surface: &mut dyn Surface, err: ExplorerError) -> ExplorerError {
    surface.error(&err);
    err
}

/// Menu entries offered between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    ChangeTarget,
    ChangeTestSize,
    ChangeModel,
    TuneParameters,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 5] = [
        MenuAction::ChangeTarget,
        MenuAction::ChangeTestSize,
        MenuAction::ChangeModel,
        MenuAction::TuneParameters,
        MenuAction::Exit,
    ];

    fn label(&self) -> &'static str {
        match self {
            MenuAction::ChangeTarget => "change target",
            MenuAction::ChangeTestSize => "change test proportion",
            MenuAction::ChangeModel => "change model",
            MenuAction::TuneParameters => "tune hyperparameters",
            MenuAction::Exit => "exit",
        }
    }
}

/// The dashboard: configuration plus the run/render loop
pub struct Dashboard {
    config: ExplorerConfig,
}

impl Dashboard {
    pub fn new(config: ExplorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Read the configured dataset
    pub fn load(&self) -> Result<Dataset> {
        let mut loader = DataLoader::new();
        if let Some(delimiter) = self.config.delimiter {
            loader = loader.with_delimiter(delimiter as u8);
        }
        loader.load_csv(&self.config.data_path)
    }

    /// One full re-run: load, preview, encode, scale, split, fit, report.
    ///
    /// Errors are rendered on `surface` before being returned. Failures
    /// before training leave nothing else on the surface; a training failure
    /// is rendered where the report would be.
    pub fn run_once(
        &self,
        selections: &Selections,
        surface: &mut dyn Surface,
    ) -> Result<RunOutcome> {
        let dataset = self.load().map_err(|e| rendered(surface, e))?;
        let run = selections.run_config(&self.config);
        let prepared = Pipeline::prepare(&dataset, &run).map_err(|e| rendered(surface, e))?;

        let rows = self.config.preview_rows;
        surface.heading("Data");
        surface.text("Here is a sample of the input data after loading:");
        surface.table(&dataset.head(rows));
        if let Some(scaled) = &prepared.scaled {
            surface.text("Here is a sample of the input data after MinMaxScaler:");
            surface.table(&scaled.head(Some(rows)));
        }

        let kind = selections.params.kind();
        surface.heading("Model");
        surface.text(&format!("{} parameters are:", kind));
        let dump = Estimator::from_params(&selections.params).params();
        surface.preformatted(&serde_json::to_string_pretty(&dump)?);

        surface.heading("Report");
        let evaluation = prepared
            .evaluate(&selections.params)
            .map_err(|e| rendered(surface, e))?;
        surface.text(&format!("Accuracy: {}", evaluation.accuracy));
        surface.preformatted(&format!("Model Report:\n {}", evaluation.report));

        Ok(RunOutcome {
            prepared,
            evaluation,
        })
    }

    /// Gather, run, then offer changes until the user exits. Every change
    /// triggers a full re-run.
    pub fn interactive(
        &self,
        controls: &mut dyn Controls,
        surface: &mut dyn Surface,
    ) -> Result<()> {
        let dataset = self.load().map_err(|e| rendered(surface, e))?;
        let mut selections = Selections::gather(&dataset, controls)?;

        loop {
            info!(target_column = %selections.target, model = %selections.params.kind(), "Running dashboard");
            if let Err(e) = self.run_once(&selections, surface) {
                warn!(error = %e, "Run failed");
            }

            let labels: Vec<String> = MenuAction::ALL.iter().map(|a| a.label().to_string()).collect();
            // Defaults to exit so that presets without an answer end the session
            let exit_idx = MenuAction::ALL.len() - 1;
            let action = match controls.select(MENU_KEY, "What would you like to change", &labels, exit_idx) {
                Ok(idx) => MenuAction::ALL[idx],
                Err(ExplorerError::Interaction(_)) => MenuAction::Exit,
                Err(e) => return Err(e),
            };

            let dataset = self.load()?;
            let changed = match action {
                MenuAction::ChangeTarget => ask_target(&dataset, controls).map(|target| {
                    selections.target = target;
                }),
                MenuAction::ChangeTestSize => ask_test_size(controls).map(|p| {
                    selections.test_proportion = p;
                }),
                MenuAction::ChangeModel => ask_model(controls).map(|params| {
                    selections.params = params;
                }),
                MenuAction::TuneParameters => {
                    selections.params.kind().collect_params(controls).map(|params| {
                        selections.params = params;
                    })
                }
                MenuAction::Exit => break,
            };

            match changed {
                Ok(()) => {}
                Err(ExplorerError::Interaction(_)) => continue,
                Err(e) => surface.error(&e),
            }
        }

        controls.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use std::io::Write;

    fn write_listings() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Price,Room_Type,Target").unwrap();
        for i in 0..20 {
            let room = if i % 2 == 0 { "entire" } else { "private" };
            writeln!(file, "{},{},{}", 10 * (i + 1), room, i32::from(i >= 10)).unwrap();
        }
        file
    }

    fn dataset() -> Dataset {
        let frame = df![
            "b" => [1.0, 2.0, 3.0, 4.0],
            "a" => [0, 1, 0, 1]
        ]
        .unwrap();
        Dataset::from_frame(frame).unwrap()
    }

    #[test]
    fn test_gather_defaults() {
        let mut controls = PresetControls::new();
        let selections = Selections::gather(&dataset(), &mut controls).unwrap();

        assert_eq!(selections.target, "a");
        assert_eq!(selections.test_proportion, 0.2);
        assert_eq!(selections.params, ModelKind::DecisionTree.default_params());
    }

    #[test]
    fn test_gather_presets() {
        let mut controls = PresetControls::new()
            .with_value("target", "b")
            .with_value("test_size", 0.35)
            .with_value("model", "k nearest neighbours")
            .with_value("n_neighbors", 4);
        let selections = Selections::gather(&dataset(), &mut controls).unwrap();

        assert_eq!(selections.target, "b");
        assert_eq!(selections.test_proportion, 0.35);
        assert_eq!(selections.params, ModelParams::KNearestNeighbours { n_neighbors: 4 });
    }

    #[test]
    fn test_gather_skips_other_model_parameter() {
        let mut controls = PresetControls::new()
            .with_value("model", "gaussian naive bayes")
            .with_value("max_depth", 3);
        let selections = Selections::gather(&dataset(), &mut controls).unwrap();

        assert_eq!(selections.params, ModelParams::GaussianNaiveBayes);
        assert!(selections.params.to_map().is_empty());
        assert!(controls.finish().is_ok());
    }

    #[test]
    fn test_gather_then_finish_rejects_unknown_key() {
        let mut controls = PresetControls::new().with_value("depth", 3);
        Selections::gather(&dataset(), &mut controls).unwrap();
        assert!(matches!(
            controls.finish(),
            Err(ExplorerError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_run_once_renders_report() {
        let file = write_listings();
        let dashboard = Dashboard::new(ExplorerConfig::new().with_data_path(file.path()));
        let selections = Selections {
            target: "target".to_string(),
            test_proportion: 0.2,
            params: ModelParams::GaussianNaiveBayes,
        };

        let mut surface = BufferSurface::new();
        let outcome = dashboard.run_once(&selections, &mut surface).unwrap();

        assert!(surface.errors().is_empty());
        assert_eq!(surface.tables().len(), 2);
        assert!(surface.contains("gaussian naive bayes parameters are:"));
        assert!(surface.contains("var_smoothing"));
        assert!(surface.contains("Accuracy: "));
        assert!(surface.contains("precision    recall  f1-score   support"));
        assert_eq!(outcome.split().n_test(), 4);
    }

    #[test]
    fn test_run_once_missing_file_renders_only_error() {
        let dashboard = Dashboard::new(ExplorerConfig::new().with_data_path("/no/such/file.csv"));
        let selections = Selections {
            target: "target".to_string(),
            test_proportion: 0.2,
            params: ModelParams::GaussianNaiveBayes,
        };

        let mut surface = BufferSurface::new();
        let err = dashboard.run_once(&selections, &mut surface).unwrap_err();

        assert!(matches!(err, ExplorerError::DataLoad(_)));
        assert_eq!(surface.items().len(), 1);
        assert_eq!(surface.errors().len(), 1);
    }

    #[test]
    fn test_interactive_runs_once_and_exits() {
        let file = write_listings();
        let dashboard = Dashboard::new(ExplorerConfig::new().with_data_path(file.path()));
        let mut controls = PresetControls::new()
            .with_value("target", "target")
            .with_value("model", "logistic regression")
            .with_value("C", 10);

        let mut surface = BufferSurface::new();
        dashboard.interactive(&mut controls, &mut surface).unwrap();

        assert!(surface.contains("Model Report:"));
    }

    #[test]
    fn test_interactive_menu_preset_reruns_then_exits() {
        let file = write_listings();
        let dashboard = Dashboard::new(ExplorerConfig::new().with_data_path(file.path()));
        let mut controls = PresetControls::new()
            .with_value("target", "target")
            .with_value("model", "gaussian naive bayes")
            .with_value("action", "change test proportion")
            .with_value("test_size", 0.25);

        let mut surface = BufferSurface::new();
        dashboard.interactive(&mut controls, &mut surface).unwrap();

        let reports = surface
            .items()
            .iter()
            .filter(|item| **item == SurfaceItem::Heading("Report".to_string()))
            .count();
        assert_eq!(reports, 2);
        assert!(surface.errors().is_empty());
    }
}
