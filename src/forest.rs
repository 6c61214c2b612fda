use std::fmt;

use serde::{Deserialize, Serialize};

/// One node of a decision tree in array form.
///
/// Internal nodes carry a split (`feature >= 0`) and child indices; leaves
/// carry `feature == -1` and a margin contribution in `value`. `cover` is the
/// training-sample weight that reached the node, required for attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
	pub feature: i32,
	pub threshold: f64,
	pub left: i32,
	pub right: i32,
	pub default_left: bool,
	pub cover: f64,
	pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
	pub nodes: Vec<Node>,
}

/// Training run's evaluation report, persisted with the model so serving can
/// report metrics without hardcoding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
	pub accuracy: f64,
	pub auc_roc: f64,
	pub trained_at: String,
}

/// Trained gradient-boosted ensemble, loaded from a versioned JSON artifact.
///
/// The margin output scores `positive_class`; probability is its sigmoid.
/// The positive class is bound by label, never by array position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forest {
	pub version: String,
	pub n_features: usize,
	pub base_score: f64,
	pub class_labels: Vec<String>,
	pub positive_class: String,
	pub trees: Vec<Tree>,
	pub evaluation: EvaluationReport,
}

#[derive(Debug, PartialEq)]
pub enum ForestError {
	FeatureShape { expected: usize, got: usize },
	UnknownPositiveClass(String),
}

impl fmt::Display for ForestError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			ForestError::FeatureShape { expected, got } => {
				write!(f, "expected {} features, got {}", expected, got)
			}
			ForestError::UnknownPositiveClass(label) => {
				write!(f, "positive class {:?} is not among the model's class labels", label)
			}
		}
	}
}

impl std::error::Error for ForestError {}

impl Tree {
	pub fn is_leaf(&self, node: usize) -> bool {
		self.nodes[node].feature < 0
	}

	/// Walk to the leaf a sample lands in. A NaN feature follows the node's
	/// default direction, mirroring how the trees were grown.
	pub fn leaf_index(&self, features: &[f64]) -> usize {
		let mut node = 0;
		while !self.is_leaf(node) {
			let split = &self.nodes[node];
			let value = features[split.feature as usize];
			let go_left = if value.is_nan() {
				split.default_left
			} else {
				value < split.threshold
			};
			node = if go_left { split.left as usize } else { split.right as usize };
		}
		node
	}

	pub fn predict_margin(&self, features: &[f64]) -> f64 {
		self.nodes[self.leaf_index(features)].value
	}

	/// Cover-weighted mean leaf value: the tree's output for an "average"
	/// training sample, used as the attribution baseline.
	pub fn expected_value(&self) -> f64 {
		self.expected_at(0)
	}

	fn expected_at(&self, node: usize) -> f64 {
		if self.is_leaf(node) {
			return self.nodes[node].value;
		}
		let split = &self.nodes[node];
		let left = split.left as usize;
		let right = split.right as usize;
		let total = self.nodes[left].cover + self.nodes[right].cover;
		(self.nodes[left].cover * self.expected_at(left)
			+ self.nodes[right].cover * self.expected_at(right))
			/ total
	}
}

impl Forest {
	/// Index of the positive class within `class_labels`.
	///
	/// Errors when the artifact's labels and positive class disagree, so a
	/// malformed artifact fails at load rather than silently attributing the
	/// wrong class.
	pub fn positive_output(&self) -> Result<usize, ForestError> {
		self.class_labels
			.iter()
			.position(|label| label == &self.positive_class)
			.ok_or_else(|| ForestError::UnknownPositiveClass(self.positive_class.clone()))
	}

	pub fn predict_margin(&self, features: &[f64]) -> Result<f64, ForestError> {
		if features.len() != self.n_features {
			return Err(ForestError::FeatureShape {
				expected: self.n_features,
				got: features.len(),
			});
		}

		let mut margin = self.base_score;
		for tree in &self.trees {
			margin += tree.predict_margin(features);
		}
		Ok(margin)
	}

	/// Probability of the positive ("default") class, in [0, 1].
	pub fn predict_probability(&self, features: &[f64]) -> Result<f64, ForestError> {
		Ok(sigmoid(self.predict_margin(features)?))
	}

	/// Margin the ensemble emits for an average training sample; the
	/// attribution baseline.
	pub fn expected_margin(&self) -> f64 {
		self.base_score + self.trees.iter().map(Tree::expected_value).sum::<f64>()
	}
}

pub fn sigmoid(margin: f64) -> f64 {
	1.0 / (1.0 + (-margin).exp())
}

/// Hand-built ensembles for tests; mirrors the shapes the trainer emits.
pub mod testing {
	use super::*;

	/// Leaf node helper for hand-built test trees.
	pub fn leaf(value: f64, cover: f64) -> Node {
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

	/// Internal split helper for hand-built test trees.
	pub fn split(feature: i32, threshold: f64, left: i32, right: i32, cover: f64) -> Node {
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

	/// Single-split tree: `feature < threshold` gives the left value.
	pub fn stump(feature: i32, threshold: f64, left_value: f64, right_value: f64) -> Tree {
		Tree {
			nodes: vec![
				split(feature, threshold, 1, 2, 100.0),
				leaf(left_value, 50.0),
				leaf(right_value, 50.0),
			],
		}
	}

	pub fn forest(n_features: usize, base_score: f64, trees: Vec<Tree>) -> Forest {
		Forest {
			version: "v1".to_string(),
			n_features,
			base_score,
			class_labels: vec!["no_default".to_string(), "default".to_string()],
			positive_class: "default".to_string(),
			trees,
			evaluation: EvaluationReport {
				accuracy: 0.9,
				auc_roc: 0.95,
				trained_at: "2026-07-15T09:30:00Z".to_string(),
			},
		}
	}
}
