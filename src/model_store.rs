use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::{env, fmt, fs, io};

use log::{info, warn};
use serde::de::DeserializeOwned;

use crate::forest::Forest;
use crate::pipeline::FittedPipeline;

/// Locations of the two serving artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
	pub model: PathBuf,
	pub preprocessor: PathBuf,
}

impl ArtifactPaths {
	pub fn new(model: impl Into<PathBuf>, preprocessor: impl Into<PathBuf>) -> Self {
		ArtifactPaths {
			model: model.into(),
			preprocessor: preprocessor.into(),
		}
	}

	/// `MODEL_PATH` / `PREPROCESSOR_PATH` from the environment, with the
	/// trainer's default output locations as fallback
	pub fn from_env() -> Self {
		ArtifactPaths {
			model: env::var("MODEL_PATH")
				.unwrap_or_else(|_| "models/risk_model_v1.json".to_string())
				.into(),
			preprocessor: env::var("PREPROCESSOR_PATH")
				.unwrap_or_else(|_| "models/preprocessor_v1.json".to_string())
				.into(),
		}
	}
}

/// Error that can occur when loading a serving artifact
#[derive(Debug)]
pub enum ArtifactError {
	Missing(PathBuf),
	Io(PathBuf, io::Error),
	Format(PathBuf, serde_json::Error),
	Invalid(String),
}

impl fmt::Display for ArtifactError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			ArtifactError::Missing(path) => write!(f, "artifact {} does not exist", path.display()),
			ArtifactError::Io(path, e) => write!(f, "reading artifact {}: {}", path.display(), e),
			ArtifactError::Format(path, e) => write!(f, "decoding artifact {}: {}", path.display(), e),
			ArtifactError::Invalid(msg) => write!(f, "invalid artifact: {}", msg),
		}
	}
}

impl std::error::Error for ArtifactError {}

/// The classifier and its fitted preprocessor, loaded together and treated as
/// read-only for their lifetime.
#[derive(Debug)]
pub struct ScoringArtifacts {
	pub forest: Forest,
	pub pipeline: FittedPipeline,
}

impl ScoringArtifacts {
	pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
		let forest: Forest = read_artifact(&paths.model)?;
		let pipeline: FittedPipeline = read_artifact(&paths.preprocessor)?;

		if forest.n_features != pipeline.n_features() {
			return Err(ArtifactError::Invalid(format!(
				"model expects {} features but the preprocessor produces {}",
				forest.n_features,
				pipeline.n_features(),
			)));
		}
		forest
			.positive_output()
			.map_err(|e| ArtifactError::Invalid(e.to_string()))?;

		Ok(ScoringArtifacts { forest, pipeline })
	}
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
	if !path.exists() {
		return Err(ArtifactError::Missing(path.to_path_buf()));
	}
	let raw = fs::read_to_string(path).map_err(|e| ArtifactError::Io(path.to_path_buf(), e))?;
	serde_json::from_str(&raw).map_err(|e| ArtifactError::Format(path.to_path_buf(), e))
}

/// Process-wide holder of the serving artifacts.
///
/// Reads take a cheap shared lock and clone an `Arc`, so an in-flight
/// prediction keeps whatever artifacts it captured. A missing model is lazily
/// loaded under the write lock; the double check means two concurrent
/// first-use discoveries produce a single load, and a failed load leaves the
/// store empty and retryable.
pub struct ModelStore {
	paths: ArtifactPaths,
	state: RwLock<Option<Arc<ScoringArtifacts>>>,
}

impl ModelStore {
	pub fn new(paths: ArtifactPaths) -> Self {
		ModelStore {
			paths,
			state: RwLock::new(None),
		}
	}

	pub fn from_env() -> Self {
		ModelStore::new(ArtifactPaths::from_env())
	}

	pub fn paths(&self) -> &ArtifactPaths {
		&self.paths
	}

	pub fn loaded(&self) -> bool {
		self.state
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.is_some()
	}

	/// Current artifacts, loading them on first use.
	pub fn get(&self) -> Result<Arc<ScoringArtifacts>, ArtifactError> {
		if let Some(artifacts) = self
			.state
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.as_ref()
		{
			return Ok(Arc::clone(artifacts));
		}

		let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
		if let Some(artifacts) = state.as_ref() {
			// another request finished the load while we waited
			return Ok(Arc::clone(artifacts));
		}

		let artifacts = Arc::new(ScoringArtifacts::load(&self.paths)?);
		info!(
			target: "risk::model",
			"loaded model {} ({} trees, {} features)",
			artifacts.forest.version,
			artifacts.forest.trees.len(),
			artifacts.forest.n_features,
		);
		*state = Some(Arc::clone(&artifacts));
		Ok(artifacts)
	}

	/// Eager startup load; leaves the store retryable when artifacts are not
	/// there yet.
	pub fn ensure_loaded(&self) -> Result<(), ArtifactError> {
		self.get().map(|_| ()).map_err(|e| {
			warn!(target: "risk::model", "model artifacts not available: {}", e);
			e
		})
	}
}
