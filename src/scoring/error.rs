use std::error;
use std::fmt;

use crate::db;
use crate::forest::ForestError;
use crate::model_store::ArtifactError;

/// An error that can occur while scoring a loan application
#[derive(Debug)]
pub struct Error {
	kind: ErrorKind,
}

impl Error {
	pub fn new(kind: ErrorKind) -> Error {
		Error { kind }
	}

	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}
}

/// The kind of an error that can occur.
#[derive(Debug)]
pub enum ErrorKind {
	Database(db::Error),
	/// Classifier or preprocessor artifact could not be loaded; the borrower
	/// and application rows written before the load attempt stay committed
	ModelUnavailable(ArtifactError),
	Scoring(ForestError),
	Serialization(serde_json::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match &self.kind {
			ErrorKind::Database(e) => write!(f, "db error: {}", e),
			ErrorKind::ModelUnavailable(e) => write!(f, "model not loaded: {}", e),
			ErrorKind::Scoring(e) => write!(f, "scoring error: {}", e),
			ErrorKind::Serialization(e) => write!(f, "serializing explanation: {}", e),
		}
	}
}

impl error::Error for Error {}

impl From<db::Error> for Error {
	fn from(e: db::Error) -> Self {
		Error::new(ErrorKind::Database(e))
	}
}

impl From<r2d2::Error> for Error {
	fn from(e: r2d2::Error) -> Self {
		Error::new(ErrorKind::Database(db::Error::from(e)))
	}
}

impl From<ArtifactError> for Error {
	fn from(e: ArtifactError) -> Self {
		Error::new(ErrorKind::ModelUnavailable(e))
	}
}

impl From<ForestError> for Error {
	fn from(e: ForestError) -> Self {
		Error::new(ErrorKind::Scoring(e))
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Error::new(ErrorKind::Serialization(e))
	}
}
