mod common;

use serde_json::{json, Value};
use warp::Filter;

use credit_risk_api::api::{handle_rejection, routes, Context};

use crate::common::{sample_request, Fixture, Suite};

fn context(fixture: &Fixture) -> Context {
	Context {
		pool: fixture.pool(),
		models: fixture.models.clone(),
	}
}

fn predict_body() -> Value {
	json!({
		"borrower": {
			"full_name": "Alex Morgan",
			"age": 30,
			"gender": "Male",
			"income": 50000.0,
			"employment_duration": 24,
			"housing_status": "Rent"
		},
		"loan_amount": 10000.0,
		"loan_purpose": "car",
		"tenure": 36,
		"interest_rate": 0.1,
		"credit_score": 600,
		"previous_defaults": 0,
		"debt_to_income_ratio": 0.3
	})
}

#[tokio::test]
async fn root_banner() {
	let f = Fixture::new();
	let api = routes(context(&f)).recover(handle_rejection);

	let res = warp::test::request().method("GET").path("/").reply(&api).await;
	assert_eq!(res.status(), 200);

	let body: Value = serde_json::from_slice(res.body()).unwrap();
	assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn health_reports_status_and_timestamp() {
	let f = Fixture::new();
	let api = routes(context(&f)).recover(handle_rejection);

	let res = warp::test::request().method("GET").path("/health").reply(&api).await;
	assert_eq!(res.status(), 200);

	let body: Value = serde_json::from_slice(res.body()).unwrap();
	assert_eq!(body["status"], "healthy");
	assert!(body["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn predict_returns_scored_application() {
	let f = Fixture::new();
	let api = routes(context(&f)).recover(handle_rejection);

	let res = warp::test::request()
		.method("POST")
		.path("/predict")
		.json(&predict_body())
		.reply(&api)
		.await;
	assert_eq!(res.status(), 200);

	let body: Value = serde_json::from_slice(res.body()).unwrap();
	assert_eq!(body["application_id"], 1);
	let probability = body["probability"].as_f64().unwrap();
	assert!((0.0..=1.0).contains(&probability));
	assert!(body["explanation"].as_array().unwrap().len() <= 5);
	assert!(body["prediction"].is_boolean());
	assert!(["Low", "Medium", "High"].contains(&body["risk_level"].as_str().unwrap()));
	assert!(["Approved", "Review Required", "Reject"]
		.contains(&body["recommendation"].as_str().unwrap()));
}

#[tokio::test]
async fn predict_rejects_invalid_fields_before_persisting() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);
	let api = routes(context(&f)).recover(handle_rejection);

	let mut body = predict_body();
	body["borrower"]["age"] = json!(16);

	let res = warp::test::request()
		.method("POST")
		.path("/predict")
		.json(&body)
		.reply(&api)
		.await;
	assert_eq!(res.status(), 400);

	let body: Value = serde_json::from_slice(res.body()).unwrap();
	assert!(body["detail"].as_str().unwrap().contains("age"));
	assert!(suite.borrower_repo.find_by_id(1).is_err());
}

#[tokio::test]
async fn predict_without_model_is_a_server_error() {
	let f = Fixture::without_artifacts();
	let api = routes(context(&f)).recover(handle_rejection);

	let res = warp::test::request()
		.method("POST")
		.path("/predict")
		.json(&predict_body())
		.reply(&api)
		.await;
	assert_eq!(res.status(), 500);

	let body: Value = serde_json::from_slice(res.body()).unwrap();
	assert!(body["detail"].as_str().unwrap().contains("model not loaded"));
}

#[tokio::test]
async fn history_serializes_iso_timestamps() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);
	suite.service(&f).score_application(&sample_request()).unwrap();
	suite.service(&f).score_application(&sample_request()).unwrap();

	let api = routes(context(&f)).recover(handle_rejection);
	let res = warp::test::request()
		.method("GET")
		.path("/history?limit=1")
		.reply(&api)
		.await;
	assert_eq!(res.status(), 200);

	let body: Value = serde_json::from_slice(res.body()).unwrap();
	let entries = body.as_array().unwrap();
	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0]["application_id"], 2);
	assert!(entries[0]["created_at"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn model_metrics_come_from_the_artifact() {
	let f = Fixture::new();
	let api = routes(context(&f)).recover(handle_rejection);

	let res = warp::test::request()
		.method("GET")
		.path("/model-metrics")
		.reply(&api)
		.await;
	assert_eq!(res.status(), 200);

	let body: Value = serde_json::from_slice(res.body()).unwrap();
	assert_eq!(body["version"], "v1");
	assert!(body["accuracy"].as_f64().unwrap() > 0.0);
	assert!(body["auc_roc"].as_f64().unwrap() > 0.0);
	assert!(body["last_trained"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn model_metrics_without_artifacts_is_a_server_error() {
	let f = Fixture::without_artifacts();
	let api = routes(context(&f)).recover(handle_rejection);

	let res = warp::test::request()
		.method("GET")
		.path("/model-metrics")
		.reply(&api)
		.await;
	assert_eq!(res.status(), 500);
}

fn multipart_body(boundary: &str, filename: &str, content: &str) -> String {
	format!(
		"--{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"{f}\"\r\ncontent-type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
		b = boundary,
		f = filename,
		c = content,
	)
}

#[tokio::test]
async fn upload_data_counts_csv_rows() {
	let f = Fixture::new();
	let api = routes(context(&f)).recover(handle_rejection);

	let boundary = "------------------------loanbatch";
	let csv = "age,income,credit_score\n30,50000,600\n41,62000,710\n";

	let res = warp::test::request()
		.method("POST")
		.path("/upload-data")
		.header(
			"content-type",
			format!("multipart/form-data; boundary={}", boundary),
		)
		.body(multipart_body(boundary, "loans.csv", csv))
		.reply(&api)
		.await;
	assert_eq!(res.status(), 200);

	let body: Value = serde_json::from_slice(res.body()).unwrap();
	assert_eq!(body["summary"]["records_processed"], 2);
}

#[tokio::test]
async fn upload_data_rejects_non_csv_filename() {
	let f = Fixture::new();
	let api = routes(context(&f)).recover(handle_rejection);

	let boundary = "------------------------loanbatch";
	let res = warp::test::request()
		.method("POST")
		.path("/upload-data")
		.header(
			"content-type",
			format!("multipart/form-data; boundary={}", boundary),
		)
		.body(multipart_body(boundary, "loans.txt", "age\n30\n"))
		.reply(&api)
		.await;
	assert_eq!(res.status(), 400);

	let body: Value = serde_json::from_slice(res.body()).unwrap();
	assert_eq!(body["detail"], "Only CSV files are allowed");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
	let f = Fixture::new();
	let api = routes(context(&f)).recover(handle_rejection);

	let res = warp::test::request().method("GET").path("/nope").reply(&api).await;
	assert_eq!(res.status(), 404);
}
