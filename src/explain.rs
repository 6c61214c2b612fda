use serde::{Deserialize, Serialize};

use crate::forest::{Forest, ForestError, Tree};

/// Signed contribution of one feature to a single prediction's margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
	pub feature: String,
	pub impact: f64,
}

/// Exact per-feature attributions for one preprocessed row, covering every
/// feature the pipeline produced.
///
/// Contributions are computed with the TreeSHAP path algorithm (Lundberg et
/// al.) over the ensemble's cover statistics, in margin space; their sum plus
/// `Forest::expected_margin` reproduces the row's margin. The returned list
/// is ordered by descending absolute impact; equal magnitudes keep the
/// layout order the attribution pass produced (the sort is stable).
pub fn explain(
	forest: &Forest,
	feature_names: &[String],
	features: &[f64],
) -> Result<Vec<FeatureImpact>, ForestError> {
	if features.len() != forest.n_features || feature_names.len() != forest.n_features {
		return Err(ForestError::FeatureShape {
			expected: forest.n_features,
			got: features.len().min(feature_names.len()),
		});
	}
	// the single margin output scores this class; resolve it by label
	forest.positive_output()?;

	let mut phi = vec![0.0; forest.n_features];
	for tree in &forest.trees {
		tree_shap(tree, features, &mut phi, 0, &[], 1.0, 1.0, -1);
	}

	let mut impacts: Vec<FeatureImpact> = feature_names
		.iter()
		.zip(phi)
		.map(|(name, impact)| FeatureImpact {
			feature: name.clone(),
			impact,
		})
		.collect();
	impacts.sort_by(|a, b| b.impact.abs().total_cmp(&a.impact.abs()));

	Ok(impacts)
}

/// One feature's state along the active decision path.
#[derive(Debug, Clone, Copy)]
struct PathElement {
	feature: i32,
	/// Fraction of paths that flow through when the feature is unknown.
	zero_fraction: f64,
	/// Whether the sample itself flows through (1) or not (0).
	one_fraction: f64,
	/// Permutation weight accumulated for this path prefix.
	pweight: f64,
}

/// Grow the path by one feature, updating permutation weights.
fn extend(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: i32) {
	let depth = path.len();
	path.push(PathElement {
		feature,
		zero_fraction,
		one_fraction,
		pweight: if depth == 0 { 1.0 } else { 0.0 },
	});
	for i in (0..depth).rev() {
		let carried = path[i].pweight;
		path[i + 1].pweight += one_fraction * carried * (i + 1) as f64 / (depth + 1) as f64;
		path[i].pweight = zero_fraction * carried * (depth - i) as f64 / (depth + 1) as f64;
	}
}

/// Remove the element at `index`, restoring the weights extend() produced
/// without it.
fn unwind(path: &mut Vec<PathElement>, index: usize) {
	let depth = path.len() - 1;
	let one_fraction = path[index].one_fraction;
	let zero_fraction = path[index].zero_fraction;
	let mut next_one_portion = path[depth].pweight;

	for i in (0..depth).rev() {
		if one_fraction != 0.0 {
			let tmp = path[i].pweight;
			path[i].pweight = next_one_portion * (depth + 1) as f64 / ((i + 1) as f64 * one_fraction);
			next_one_portion =
				tmp - path[i].pweight * zero_fraction * (depth - i) as f64 / (depth + 1) as f64;
		} else {
			path[i].pweight =
				path[i].pweight * (depth + 1) as f64 / (zero_fraction * (depth - i) as f64);
		}
	}
	for i in index..depth {
		path[i].feature = path[i + 1].feature;
		path[i].zero_fraction = path[i + 1].zero_fraction;
		path[i].one_fraction = path[i + 1].one_fraction;
	}
	path.pop();
}

/// Total permutation weight of the path with the element at `index` removed,
/// without mutating the path.
fn unwound_sum(path: &[PathElement], index: usize) -> f64 {
	let depth = path.len() - 1;
	let one_fraction = path[index].one_fraction;
	let zero_fraction = path[index].zero_fraction;
	let mut next_one_portion = path[depth].pweight;
	let mut total = 0.0;

	for i in (0..depth).rev() {
		if one_fraction != 0.0 {
			let tmp = next_one_portion * (depth + 1) as f64 / ((i + 1) as f64 * one_fraction);
			total += tmp;
			next_one_portion =
				path[i].pweight - tmp * zero_fraction * (depth - i) as f64 / (depth + 1) as f64;
		} else if zero_fraction != 0.0 {
			total += (path[i].pweight / zero_fraction) / ((depth - i) as f64 / (depth + 1) as f64);
		}
	}
	total
}

/// Recursive attribution over one tree. Each call owns a copy of the parent
/// path; the hot branch is the one the sample actually takes.
#[allow(clippy::too_many_arguments)]
fn tree_shap(
	tree: &Tree,
	features: &[f64],
	phi: &mut [f64],
	node: usize,
	parent_path: &[PathElement],
	parent_zero_fraction: f64,
	parent_one_fraction: f64,
	parent_feature: i32,
) {
	let mut path = parent_path.to_vec();
	extend(&mut path, parent_zero_fraction, parent_one_fraction, parent_feature);

	if tree.is_leaf(node) {
		let leaf_value = tree.nodes[node].value;
		for i in 1..path.len() {
			let weight = unwound_sum(&path, i);
			let element = &path[i];
			phi[element.feature as usize] +=
				weight * (element.one_fraction - element.zero_fraction) * leaf_value;
		}
		return;
	}

	let split = &tree.nodes[node];
	let left = split.left as usize;
	let right = split.right as usize;
	let value = features[split.feature as usize];
	let go_left = if value.is_nan() { split.default_left } else { value < split.threshold };
	let (hot, cold) = if go_left { (left, right) } else { (right, left) };

	let node_cover = tree.nodes[left].cover + tree.nodes[right].cover;
	let hot_zero_fraction = tree.nodes[hot].cover / node_cover;
	let cold_zero_fraction = tree.nodes[cold].cover / node_cover;
	let mut incoming_zero_fraction = 1.0;
	let mut incoming_one_fraction = 1.0;

	// a feature already on the path is unwound and re-extended so its
	// fractions multiply instead of double-counting
	if let Some(index) = path.iter().position(|e| e.feature == split.feature) {
		incoming_zero_fraction = path[index].zero_fraction;
		incoming_one_fraction = path[index].one_fraction;
		unwind(&mut path, index);
	}

	tree_shap(
		tree,
		features,
		phi,
		hot,
		&path,
		hot_zero_fraction * incoming_zero_fraction,
		incoming_one_fraction,
		split.feature,
	);
	tree_shap(
		tree,
		features,
		phi,
		cold,
		&path,
		cold_zero_fraction * incoming_zero_fraction,
		0.0,
		split.feature,
	);
}
