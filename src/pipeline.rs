use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Raw columns the fitted pipeline expects, in output-layout order.
pub const NUMERIC_COLUMNS: [&str; 8] = [
	"age",
	"income",
	"employment_duration",
	"loan_amount",
	"tenure",
	"credit_score",
	"previous_defaults",
	"debt_to_income_ratio",
];
pub const CATEGORICAL_COLUMNS: [&str; 2] = ["gender", "housing_status"];

/// Sentinel category imputed for an absent categorical value.
pub const MISSING_CATEGORY: &str = "missing";

/// Training-time statistics for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
	pub name: String,
	pub median: f64,
	pub mean: f64,
	pub std_dev: f64,
}

/// Training-time vocabulary for one categorical column.
///
/// The category order fixes the one-hot block layout; a value outside the
/// vocabulary encodes as an all-zero block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
	pub name: String,
	pub categories: Vec<String>,
}

/// Fitted preprocessing state, persisted at training time and loaded verbatim
/// at inference time. Never refit here; a freshly-fit transform at inference
/// would silently shift every feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
	pub version: String,
	pub numeric: Vec<NumericColumn>,
	pub categorical: Vec<CategoricalColumn>,
}

/// One raw observation keyed by column name. Absent keys are treated as
/// missing values and imputed.
#[derive(Debug, Clone, Default)]
pub struct FeatureRow {
	numeric: HashMap<String, f64>,
	categorical: HashMap<String, String>,
}

impl FeatureRow {
	pub fn new() -> Self {
		Default::default()
	}

	pub fn set_numeric(&mut self, name: &str, value: f64) {
		self.numeric.insert(name.to_string(), value);
	}

	pub fn set_categorical(&mut self, name: &str, value: &str) {
		self.categorical.insert(name.to_string(), value.to_string());
	}
}

impl FittedPipeline {
	/// Width of the output vector.
	pub fn n_features(&self) -> usize {
		self.numeric.len() + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
	}

	/// Column labels in output order, for attribution reporting.
	pub fn feature_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.numeric.iter().map(|c| c.name.clone()).collect();
		for column in &self.categorical {
			for category in &column.categories {
				names.push(format!("{}_{}", column.name, category));
			}
		}
		names
	}

	/// Deterministic transform of a raw row into the model's feature space.
	///
	/// Numeric: median imputation, then standardization with training
	/// statistics. Categorical: sentinel imputation, then one-hot against the
	/// training vocabulary; unseen categories yield an all-zero block rather
	/// than an error.
	pub fn transform(&self, row: &FeatureRow) -> Vec<f64> {
		let mut out = Vec::with_capacity(self.n_features());

		for column in &self.numeric {
			let raw = row
				.numeric
				.get(&column.name)
				.copied()
				.filter(|v| !v.is_nan())
				.unwrap_or(column.median);
			// zero variance in training degrades to unit scale
			let scale = if column.std_dev == 0.0 { 1.0 } else { column.std_dev };
			out.push((raw - column.mean) / scale);
		}

		for column in &self.categorical {
			let value = row
				.categorical
				.get(&column.name)
				.map(String::as_str)
				.unwrap_or(MISSING_CATEGORY);
			for category in &column.categories {
				out.push(if category == value { 1.0 } else { 0.0 });
			}
		}

		out
	}
}
