use log::{debug, warn};

use crate::application::{self, LoanApplication, NewApplication};
use crate::borrower::{self, Borrower, NewBorrower};
use crate::explain::{self, FeatureImpact};
use crate::model_store::ModelStore;
use crate::pipeline::FeatureRow;
use crate::policy::{self, Recommendation, RiskLevel};
use crate::prediction::{self, NewPrediction, PredictionRecord};
use crate::types::Id;

use super::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// How many attributions the response carries; the persisted record keeps
/// the full vector.
const EXPLANATION_LIMIT: usize = 5;

/// Service for scoring loan applications and reading the audit trail
pub struct Service<'a> {
	borrower_repo: &'a borrower::Repo,
	application_repo: &'a application::Repo,
	prediction_repo: &'a prediction::Repo,
	models: &'a ModelStore,
}

/// Parameter object for creating a new Service
pub struct NewService<'a> {
	pub borrower_repo: &'a borrower::Repo,
	pub application_repo: &'a application::Repo,
	pub prediction_repo: &'a prediction::Repo,
	pub models: &'a ModelStore,
}

/// Borrower fields as submitted with an application
#[derive(Debug, Clone)]
pub struct BorrowerProfile {
	pub full_name: String,
	pub age: i32,
	pub gender: String,
	pub income: f64,
	pub employment_duration: i32,
	pub housing_status: String,
}

/// One scoring request: loan terms plus the borrower submitting them
#[derive(Debug, Clone)]
pub struct ApplicationRequest {
	pub borrower: BorrowerProfile,
	pub loan_amount: f64,
	pub loan_purpose: String,
	pub tenure: i32,
	pub interest_rate: f64,
	pub credit_score: i32,
	pub previous_defaults: i32,
	pub debt_to_income_ratio: f64,
}

/// Assembled scoring outcome returned to the API layer
#[derive(Debug)]
pub struct Scored {
	pub application_id: Id,
	pub probability: f64,
	pub risk_level: RiskLevel,
	pub prediction: bool,
	pub explanation: Vec<FeatureImpact>,
	pub recommendation: Recommendation,
}

impl<'a> Service<'a> {
	pub fn new(v: NewService<'a>) -> Self {
		Service {
			borrower_repo: v.borrower_repo,
			application_repo: v.application_repo,
			prediction_repo: v.prediction_repo,
			models: v.models,
		}
	}

	/// Score one application: persist the borrower, persist the application,
	/// run inference, persist the prediction, assemble the response.
	///
	/// Single pass, no retries. Each insert commits on its own; when the
	/// model is unavailable the borrower and application stay behind as a
	/// pending application with no prediction, the signal for "needs
	/// re-scoring".
	pub fn score_application(&self, request: &ApplicationRequest) -> Result<Scored> {
		let borrower = self.borrower_repo.create(NewBorrower {
			full_name: &request.borrower.full_name,
			age: request.borrower.age,
			gender: &request.borrower.gender,
			income: request.borrower.income,
			// intake requests carry no employment status field
			employment_status: "Employed",
			employment_duration: request.borrower.employment_duration,
			housing_status: &request.borrower.housing_status,
		})?;

		let application = self.application_repo.create(NewApplication {
			borrower_id: borrower.id,
			loan_amount: request.loan_amount,
			loan_purpose: &request.loan_purpose,
			tenure: request.tenure,
			interest_rate: request.interest_rate,
			credit_score: request.credit_score,
			previous_defaults: request.previous_defaults,
			debt_to_income_ratio: request.debt_to_income_ratio,
			status: Default::default(),
		})?;

		let artifacts = self.models.get().map_err(|e| {
			warn!(
				target: "risk::scoring",
				"application {} left pending, model unavailable: {}", application.id, e,
			);
			Error::from(e)
		})?;

		let row = feature_row(&borrower, &application);
		let features = artifacts.pipeline.transform(&row);
		let probability = artifacts.forest.predict_probability(&features)?;

		let risk_level = policy::risk_tier(probability);
		let prediction = policy::default_flag(probability);
		let recommendation = policy::recommendation(probability);

		let feature_names = artifacts.pipeline.feature_names();
		let mut explanation = explain::explain(&artifacts.forest, &feature_names, &features)?;
		let importance_blob = serde_json::to_string(&explanation)?;

		self.prediction_repo.create(NewPrediction {
			application_id: application.id,
			probability,
			risk_level,
			prediction,
			feature_importance: &importance_blob,
			model_version: &artifacts.forest.version,
		})?;

		debug!(
			target: "risk::scoring",
			"application {} scored p={:.4} tier={}", application.id, probability, risk_level,
		);

		explanation.truncate(EXPLANATION_LIMIT);
		Ok(Scored {
			application_id: application.id,
			probability,
			risk_level,
			prediction,
			explanation,
			recommendation,
		})
	}

	/// Most recent predictions, newest first
	pub fn history(&self, limit: i64) -> Result<Vec<PredictionRecord>> {
		self.prediction_repo.recent(limit).map_err(Into::into)
	}
}

/// Raw model inputs assembled from the two persisted records
fn feature_row(borrower: &Borrower, application: &LoanApplication) -> FeatureRow {
	let mut row = FeatureRow::new();
	row.set_numeric("age", borrower.age as f64);
	row.set_numeric("income", borrower.income);
	row.set_numeric("employment_duration", borrower.employment_duration as f64);
	row.set_numeric("loan_amount", application.loan_amount);
	row.set_numeric("tenure", application.tenure as f64);
	row.set_numeric("credit_score", application.credit_score as f64);
	row.set_numeric("previous_defaults", application.previous_defaults as f64);
	row.set_numeric("debt_to_income_ratio", application.debt_to_income_ratio);
	row.set_categorical("gender", &borrower.gender);
	row.set_categorical("housing_status", &borrower.housing_status);
	row
}
