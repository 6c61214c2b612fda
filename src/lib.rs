#[macro_use]
extern crate diesel;

pub mod schema;
pub mod types;
pub mod db;

pub mod borrower;
pub mod application;
pub mod prediction;

pub mod pipeline;
pub mod forest;
pub mod explain;
pub mod policy;
pub mod model_store;

pub mod scoring;
pub mod api;

pub use application::{ApplicationStatus, LoanApplication, NewApplication};
pub use borrower::{Borrower, NewBorrower};
pub use db::SqlitePool;
pub use explain::FeatureImpact;
pub use model_store::{ArtifactError, ArtifactPaths, ModelStore, ScoringArtifacts};
pub use policy::{Recommendation, RiskLevel};
pub use prediction::{NewPrediction, PredictionRecord};
pub use types::{Id, Time};
