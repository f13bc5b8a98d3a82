//! Integration test: dashboard runs driven by preset controls

use model_explorer::config::ExplorerConfig;
use model_explorer::dashboard::{
    BufferSurface, Controls, Dashboard, PresetControls, Selections, SurfaceItem,
};
use model_explorer::error::ExplorerError;
use model_explorer::training::{Criterion, ModelParams};
use std::io::Write;
use tempfile::NamedTempFile;

fn listings_csv() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Price,Room_Type,Neighbourhood,Target").unwrap();
    for i in 0..30 {
        let room = if i % 2 == 0 { "entire" } else { "private" };
        let hood = ["north", "south", "east"][i % 3];
        writeln!(file, "{},{},{},{}", 40 + 3 * i, room, hood, i32::from(i >= 15)).unwrap();
    }
    file
}

fn dashboard(file: &NamedTempFile) -> Dashboard {
    Dashboard::new(ExplorerConfig::new().with_data_path(file.path()))
}

#[test]
fn test_gather_and_run_with_presets() {
    let file = listings_csv();
    let dashboard = dashboard(&file);
    let dataset = dashboard.load().unwrap();

    let mut controls = PresetControls::new()
        .with_value("target", "target")
        .with_value("test_size", "0.3")
        .with_value("model", "decision trees")
        .with_value("max_depth", 3)
        .with_value("criterion", "gini");
    let selections = Selections::gather(&dataset, &mut controls).unwrap();
    assert_eq!(
        selections.params,
        ModelParams::DecisionTree { max_depth: 3, criterion: Criterion::Gini }
    );

    let mut surface = BufferSurface::new();
    let outcome = dashboard.run_once(&selections, &mut surface).unwrap();

    assert_eq!(outcome.split().n_test(), 9);
    let tables = surface.tables();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].1, 10);
    assert!(tables[1].0.contains(&"neighbourhood_south".to_string()));
    assert!(surface.contains("decision trees parameters are:"));
    assert!(surface.contains("\"max_depth\": \"3\""));
}

#[test]
fn test_out_of_range_preset_rejected() {
    let file = listings_csv();
    let dataset = dashboard(&file).load().unwrap();

    let mut controls = PresetControls::new()
        .with_value("model", "k nearest neighbours")
        .with_value("n_neighbors", 25);
    let err = Selections::gather(&dataset, &mut controls).unwrap_err();
    assert!(matches!(err, ExplorerError::InvalidParameter { .. }));
}

#[test]
fn test_config_params_of_other_models_do_not_block_naive_bayes() {
    let file = listings_csv();
    let config = ExplorerConfig::new()
        .with_data_path(file.path())
        .with_target("target")
        .with_model("gaussian naive bayes")
        .with_param("max_depth", 4);
    let dashboard = Dashboard::new(config.clone());
    let dataset = dashboard.load().unwrap();

    let mut controls = config.preset_controls();
    let selections = Selections::gather(&dataset, &mut controls).unwrap();
    controls.finish().unwrap();

    assert_eq!(selections.params, ModelParams::GaussianNaiveBayes);
    assert!(selections.params.to_map().is_empty());

    let mut surface = BufferSurface::new();
    let outcome = dashboard.run_once(&selections, &mut surface).unwrap();
    assert!(outcome.evaluation.params.is_empty());
}

#[test]
fn test_training_error_rendered_in_report_area() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "x,label").unwrap();
    for i in 0..10 {
        writeln!(file, "{},same", i).unwrap();
    }

    let dashboard = dashboard(&file);
    let selections = Selections {
        target: "label".to_string(),
        test_proportion: 0.2,
        params: ModelParams::GaussianNaiveBayes,
    };

    let mut surface = BufferSurface::new();
    let err = dashboard.run_once(&selections, &mut surface).unwrap_err();
    assert!(err.is_training());

    let items = surface.items();
    assert!(matches!(items.last(), Some(SurfaceItem::Error(_))));
    assert!(items.contains(&SurfaceItem::Heading("Report".to_string())));
    assert!(!surface.contains("Accuracy:"));
}

#[test]
fn test_interactive_session_with_presets() {
    let file = listings_csv();
    let dashboard = dashboard(&file);
    let mut controls = PresetControls::new()
        .with_value("target", "room_type")
        .with_value("model", "support vector machine")
        .with_value("C", 1)
        .with_value("kernel", "rbf");

    let mut surface = BufferSurface::new();
    dashboard.interactive(&mut controls, &mut surface).unwrap();

    assert!(surface.errors().is_empty());
    assert!(surface.contains("Model Report:"));
    assert!(surface.contains("entire"));
}
