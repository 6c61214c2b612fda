use std::convert::Infallible;
use std::sync::Arc;

use bytes::BufMut;
use chrono::Utc;
use futures_util::TryStreamExt;
use log::error;
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::{Filter, Rejection, Reply};

use crate::db::SqlitePool;
use crate::explain::FeatureImpact;
use crate::model_store::ModelStore;
use crate::policy::{Recommendation, RiskLevel};
use crate::prediction::PredictionRecord;
use crate::scoring::{self, ApplicationRequest, BorrowerProfile, NewService};
use crate::types::Id;
use crate::{application, borrower, prediction};

const DEFAULT_HISTORY_LIMIT: i64 = 10;
const MAX_JSON_BODY: u64 = 16 * 1024;
const MAX_UPLOAD_BODY: u64 = 5 * 1024 * 1024;

/// Shared handler state: the connection pool and the model store.
#[derive(Clone)]
pub struct Context {
	pub pool: SqlitePool,
	pub models: Arc<ModelStore>,
}

/// All routes with CORS applied; pair with [`handle_rejection`] to turn
/// rejections into FastAPI-style `{"detail": ...}` bodies.
pub fn routes(
	ctx: Context,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
	let root = warp::path::end().and(warp::get()).map(|| {
		warp::reply::json(&Banner {
			message: "Credit Risk Prediction API is running",
		})
	});

	let predict = warp::path("predict")
		.and(warp::path::end())
		.and(warp::post())
		.and(with_context(ctx.clone()))
		.and(warp::body::content_length_limit(MAX_JSON_BODY))
		.and(warp::body::json())
		.and_then(handle_predict);

	let history = warp::path("history")
		.and(warp::path::end())
		.and(warp::get())
		.and(with_context(ctx.clone()))
		.and(warp::query::<HistoryQuery>())
		.and_then(handle_history);

	let health = warp::path("health")
		.and(warp::path::end())
		.and(warp::get())
		.map(|| {
			warp::reply::json(&Health {
				status: "healthy",
				timestamp: Utc::now().to_rfc3339(),
			})
		});

	let model_metrics = warp::path("model-metrics")
		.and(warp::path::end())
		.and(warp::get())
		.and(with_context(ctx.clone()))
		.and_then(handle_model_metrics);

	let upload_data = warp::path("upload-data")
		.and(warp::path::end())
		.and(warp::post())
		.and(warp::multipart::form().max_length(MAX_UPLOAD_BODY))
		.and_then(handle_upload_data);

	let cors = warp::cors()
		.allow_any_origin()
		.allow_methods(vec!["GET", "POST"])
		.allow_header("content-type");

	root.or(predict)
		.or(history)
		.or(health)
		.or(model_metrics)
		.or(upload_data)
		.with(cors)
}

fn with_context(ctx: Context) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
	warp::any().map(move || ctx.clone())
}

#[derive(Debug)]
enum ApiError {
	Validation(String),
	Internal(String),
}

impl warp::reject::Reject for ApiError {}

async fn handle_predict(ctx: Context, request: PredictRequest) -> Result<impl Reply, Rejection> {
	if let Err(message) = request.validate() {
		return Err(warp::reject::custom(ApiError::Validation(message)));
	}

	let borrower_repo = borrower::Repo::new(ctx.pool.clone());
	let application_repo = application::Repo::new(ctx.pool.clone());
	let prediction_repo = prediction::Repo::new(ctx.pool.clone());
	let service = scoring::Service::new(NewService {
		borrower_repo: &borrower_repo,
		application_repo: &application_repo,
		prediction_repo: &prediction_repo,
		models: ctx.models.as_ref(),
	});

	match service.score_application(&request.into_domain()) {
		Ok(scored) => Ok(warp::reply::json(&PredictionResponse::from(scored))),
		Err(e) => {
			error!(target: "risk::api", "prediction failed: {}", e);
			Err(warp::reject::custom(ApiError::Internal(e.to_string())))
		}
	}
}

async fn handle_history(ctx: Context, query: HistoryQuery) -> Result<impl Reply, Rejection> {
	let prediction_repo = prediction::Repo::new(ctx.pool.clone());
	let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(0);

	match prediction_repo.recent(limit) {
		Ok(records) => {
			let entries: Vec<HistoryEntry> = records.iter().map(HistoryEntry::from).collect();
			Ok(warp::reply::json(&entries))
		}
		Err(e) => {
			error!(target: "risk::api", "history read failed: {}", e);
			Err(warp::reject::custom(ApiError::Internal(e.to_string())))
		}
	}
}

async fn handle_model_metrics(ctx: Context) -> Result<impl Reply, Rejection> {
	match ctx.models.get() {
		Ok(artifacts) => {
			let report = &artifacts.forest.evaluation;
			Ok(warp::reply::json(&ModelMetrics {
				accuracy: report.accuracy,
				auc_roc: report.auc_roc,
				last_trained: report.trained_at.clone(),
				version: artifacts.forest.version.clone(),
			}))
		}
		Err(e) => Err(warp::reject::custom(ApiError::Internal(e.to_string()))),
	}
}

async fn handle_upload_data(form: FormData) -> Result<impl Reply, Rejection> {
	let parts: Vec<Part> = form.try_collect().await.map_err(|e| {
		warp::reject::custom(ApiError::Validation(format!("reading multipart form: {}", e)))
	})?;

	for part in parts {
		if part.name() != "file" {
			continue;
		}
		let filename = part.filename().unwrap_or("").to_string();
		if !filename.ends_with(".csv") {
			return Err(warp::reject::custom(ApiError::Validation(
				"Only CSV files are allowed".to_string(),
			)));
		}

		let data = part
			.stream()
			.try_fold(Vec::new(), |mut buf, chunk| {
				buf.put(chunk);
				async move { Ok(buf) }
			})
			.await
			.map_err(|e| {
				warp::reject::custom(ApiError::Validation(format!("reading upload: {}", e)))
			})?;

		let mut reader = csv::ReaderBuilder::new().from_reader(data.as_slice());
		let records_processed = reader.records().count();

		// row count is real; the risk summary is a placeholder since bulk
		// uploads are not scored in this revision
		return Ok(warp::reply::json(&UploadResponse {
			message: "Data uploaded and processed".to_string(),
			summary: UploadSummary {
				records_processed,
				high_risk_count: 0,
				average_risk_score: 0.25,
			},
		}));
	}

	Err(warp::reject::custom(ApiError::Validation(
		"missing \"file\" part".to_string(),
	)))
}

/// Map every rejection to a JSON `{"detail": ...}` body with the right status.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
	let (status, detail) = if err.is_not_found() {
		(StatusCode::NOT_FOUND, "not found".to_string())
	} else if let Some(api) = err.find::<ApiError>() {
		match api {
			ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
			ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
		}
	} else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
		(StatusCode::BAD_REQUEST, e.to_string())
	} else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
		(StatusCode::BAD_REQUEST, e.to_string())
	} else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
		(StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
	} else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
		(StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
	} else {
		error!(target: "risk::api", "unhandled rejection: {:?}", err);
		(StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
	};

	Ok(warp::reply::with_status(
		warp::reply::json(&ErrorBody { detail }),
		status,
	))
}

#[derive(Debug, Deserialize)]
pub struct BorrowerPayload {
	pub full_name: String,
	pub age: i32,
	pub gender: String,
	pub income: f64,
	pub employment_duration: i32,
	pub housing_status: String,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
	pub borrower: BorrowerPayload,
	pub loan_amount: f64,
	pub loan_purpose: String,
	pub tenure: i32,
	pub interest_rate: f64,
	pub credit_score: i32,
	pub previous_defaults: i32,
	pub debt_to_income_ratio: f64,
}

impl PredictRequest {
	/// Field checks applied before anything is persisted.
	fn validate(&self) -> Result<(), String> {
		if self.borrower.full_name.trim().is_empty() {
			return Err("full_name must not be empty".to_string());
		}
		if self.borrower.age < 18 || self.borrower.age > 120 {
			return Err("age must be between 18 and 120".to_string());
		}
		if self.borrower.income < 0.0 {
			return Err("income must not be negative".to_string());
		}
		if self.borrower.employment_duration < 0 {
			return Err("employment_duration must not be negative".to_string());
		}
		if self.loan_amount <= 0.0 {
			return Err("loan_amount must be positive".to_string());
		}
		if self.tenure <= 0 {
			return Err("tenure must be positive".to_string());
		}
		if self.interest_rate < 0.0 {
			return Err("interest_rate must not be negative".to_string());
		}
		if self.credit_score <= 0 {
			return Err("credit_score must be positive".to_string());
		}
		if self.previous_defaults < 0 {
			return Err("previous_defaults must not be negative".to_string());
		}
		if self.debt_to_income_ratio < 0.0 {
			return Err("debt_to_income_ratio must not be negative".to_string());
		}
		Ok(())
	}

	fn into_domain(self) -> ApplicationRequest {
		ApplicationRequest {
			borrower: BorrowerProfile {
				full_name: self.borrower.full_name,
				age: self.borrower.age,
				gender: self.borrower.gender,
				income: self.borrower.income,
				employment_duration: self.borrower.employment_duration,
				housing_status: self.borrower.housing_status,
			},
			loan_amount: self.loan_amount,
			loan_purpose: self.loan_purpose,
			tenure: self.tenure,
			interest_rate: self.interest_rate,
			credit_score: self.credit_score,
			previous_defaults: self.previous_defaults,
			debt_to_income_ratio: self.debt_to_income_ratio,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
	pub application_id: Id,
	pub probability: f64,
	pub risk_level: RiskLevel,
	pub prediction: bool,
	pub explanation: Vec<FeatureImpact>,
	pub recommendation: Recommendation,
}

impl From<scoring::Scored> for PredictionResponse {
	fn from(scored: scoring::Scored) -> Self {
		PredictionResponse {
			application_id: scored.application_id,
			probability: scored.probability,
			risk_level: scored.risk_level,
			prediction: scored.prediction,
			explanation: scored.explanation,
			recommendation: scored.recommendation,
		}
	}
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
	limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
	pub id: Id,
	pub application_id: Id,
	pub probability: f64,
	pub risk_level: RiskLevel,
	pub prediction: bool,
	pub created_at: String,
}

impl From<&PredictionRecord> for HistoryEntry {
	fn from(record: &PredictionRecord) -> Self {
		HistoryEntry {
			id: record.id,
			application_id: record.application_id,
			probability: record.probability,
			risk_level: record.risk_level,
			prediction: record.prediction,
			created_at: record.created_at.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
		}
	}
}

#[derive(Debug, Serialize)]
pub struct ModelMetrics {
	pub accuracy: f64,
	pub auc_roc: f64,
	pub last_trained: String,
	pub version: String,
}

#[derive(Debug, Serialize)]
struct UploadSummary {
	records_processed: usize,
	high_risk_count: usize,
	average_risk_score: f64,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
	message: String,
	summary: UploadSummary,
}

#[derive(Debug, Serialize)]
struct Health {
	status: &'static str,
	timestamp: String,
}

#[derive(Debug, Serialize)]
struct Banner {
	message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	detail: String,
}
