use credit_risk_api::db;
use credit_risk_api::policy::RiskLevel;
use credit_risk_api::prediction::NewPrediction;

use crate::common::{Fixture, Suite};

fn insert_prediction(suite: &Suite, application_id: i32, probability: f64) {
	suite
		.prediction_repo
		.create(NewPrediction {
			application_id,
			probability,
			risk_level: RiskLevel::Low,
			prediction: false,
			feature_importance: "[]",
			model_version: "v1",
		})
		.unwrap();
}

#[test]
fn create_and_find_prediction() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);

	let bob = f.borrower_factory.bob();
	let application = f.application_factory.car_loan(bob.id);
	insert_prediction(&suite, application.id, 0.17);

	let found = suite.prediction_repo.find_by_application(application.id).unwrap();
	assert_eq!(found.application_id, application.id);
	assert_eq!(found.risk_level, RiskLevel::Low);
	assert!(!found.prediction);
}

#[test]
fn find_missing_prediction() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);

	let got_err = suite.prediction_repo.find_by_application(9).unwrap_err();
	assert_eq!(got_err, db::Error::RecordNotFound);
}

#[test]
fn second_prediction_for_application_is_rejected() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);

	let bob = f.borrower_factory.bob();
	let application = f.application_factory.car_loan(bob.id);
	insert_prediction(&suite, application.id, 0.2);

	let got_err = suite
		.prediction_repo
		.create(NewPrediction {
			application_id: application.id,
			probability: 0.9,
			risk_level: RiskLevel::High,
			prediction: true,
			feature_importance: "[]",
			model_version: "v1",
		})
		.unwrap_err();
	assert_eq!(got_err, db::Error::RecordAlreadyExists);
}

#[test]
fn recent_orders_newest_first_and_honors_limit() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);

	let bob = f.borrower_factory.bob();
	for probability in [0.1, 0.2, 0.3] {
		let application = f.application_factory.car_loan(bob.id);
		insert_prediction(&suite, application.id, probability);
	}

	let recent = suite.prediction_repo.recent(2).unwrap();
	assert_eq!(recent.len(), 2);
	assert!(recent[0].id > recent[1].id);
	assert!((recent[0].probability - 0.3).abs() < 1e-12);
	assert!((recent[1].probability - 0.2).abs() < 1e-12);
}
