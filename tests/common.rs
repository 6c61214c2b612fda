use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use credit_risk_api::application::{self, LoanApplication, NewApplication};
use credit_risk_api::borrower::{self, Borrower, NewBorrower};
use credit_risk_api::db::{self, SqlitePool};
use credit_risk_api::forest::testing::{forest, stump};
use credit_risk_api::forest::Forest;
use credit_risk_api::model_store::{ArtifactPaths, ModelStore};
use credit_risk_api::pipeline::{CategoricalColumn, FittedPipeline, NumericColumn};
use credit_risk_api::prediction;
use credit_risk_api::scoring::{self, ApplicationRequest, BorrowerProfile, NewService};

/// Fitted pipeline over the full raw schema: 8 numeric columns plus the two
/// one-hot blocks, 13 features wide.
pub fn test_pipeline() -> FittedPipeline {
	let numeric = |name: &str, median: f64, mean: f64, std_dev: f64| NumericColumn {
		name: name.to_string(),
		median,
		mean,
		std_dev,
	};
	FittedPipeline {
		version: "v1".to_string(),
		numeric: vec![
			numeric("age", 45.0, 45.0, 14.0),
			numeric("income", 50_000.0, 50_000.0, 19_000.0),
			numeric("employment_duration", 240.0, 240.0, 138.0),
			numeric("loan_amount", 15_000.0, 15_000.0, 9_500.0),
			numeric("tenure", 36.0, 36.0, 17.0),
			numeric("credit_score", 575.0, 575.0, 159.0),
			numeric("previous_defaults", 0.0, 0.33, 0.7),
			numeric("debt_to_income_ratio", 0.35, 0.35, 0.14),
		],
		categorical: vec![
			CategoricalColumn {
				name: "gender".to_string(),
				categories: vec!["Female".to_string(), "Male".to_string()],
			},
			CategoricalColumn {
				name: "housing_status".to_string(),
				categories: vec![
					"Mortgage".to_string(),
					"Own".to_string(),
					"Rent".to_string(),
				],
			},
		],
	}
}

pub fn test_forest() -> Forest {
	forest(
		13,
		-0.85,
		vec![stump(5, 0.0, 0.9, -0.9), stump(7, 0.0, -0.4, 0.6)],
	)
}

pub struct Fixture {
	_dir: TempDir,
	pub pool: SqlitePool,
	pub models: Arc<ModelStore>,
	pub borrower_factory: BorrowerFactory,
	pub application_factory: ApplicationFactory,
}

impl Fixture {
	pub fn new() -> Self {
		let fixture = Fixture::without_artifacts();
		fixture.seed_artifacts();
		fixture
	}

	/// A fixture whose model store points at files that do not exist yet.
	pub fn without_artifacts() -> Self {
		let dir = tempfile::tempdir().expect("create fixture dir");
		let db_path = dir.path().join("test.db");
		let pool = db::pool(db_path.to_str().expect("utf-8 path"));
		{
			let mut conn = pool.get().expect("get a db connection");
			db::run_migrations(&mut conn).expect("apply migrations");
		}

		let paths = ArtifactPaths::new(
			dir.path().join("risk_model_v1.json"),
			dir.path().join("preprocessor_v1.json"),
		);

		Fixture {
			_dir: dir,
			borrower_factory: BorrowerFactory::new(pool.clone()),
			application_factory: ApplicationFactory::new(pool.clone()),
			models: Arc::new(ModelStore::new(paths)),
			pool,
		}
	}

	pub fn pool(&self) -> SqlitePool {
		self.pool.clone()
	}

	/// Write the test artifacts where the fixture's model store expects them.
	pub fn seed_artifacts(&self) {
		let paths = self.models.paths();
		fs::write(&paths.model, serde_json::to_string(&test_forest()).unwrap()).unwrap();
		fs::write(
			&paths.preprocessor,
			serde_json::to_string(&test_pipeline()).unwrap(),
		)
		.unwrap();
	}
}

pub struct Suite {
	pub borrower_repo: borrower::Repo,
	pub application_repo: application::Repo,
	pub prediction_repo: prediction::Repo,
}

impl Suite {
	pub fn setup(fixture: &Fixture) -> Self {
		Suite {
			borrower_repo: borrower::Repo::new(fixture.pool()),
			application_repo: application::Repo::new(fixture.pool()),
			prediction_repo: prediction::Repo::new(fixture.pool()),
		}
	}

	pub fn service<'a>(&'a self, fixture: &'a Fixture) -> scoring::Service<'a> {
		scoring::Service::new(NewService {
			borrower_repo: &self.borrower_repo,
			application_repo: &self.application_repo,
			prediction_repo: &self.prediction_repo,
			models: fixture.models.as_ref(),
		})
	}
}

#[test]
fn test_suite_setup() {
	let fixture = Fixture::new();
	let _suite = Suite::setup(&fixture);
}

/// The end-to-end sample application: a renter buying a car.
pub fn sample_request() -> ApplicationRequest {
	ApplicationRequest {
		borrower: BorrowerProfile {
			full_name: "Alex Morgan".to_string(),
			age: 30,
			gender: "Male".to_string(),
			income: 50_000.0,
			employment_duration: 24,
			housing_status: "Rent".to_string(),
		},
		loan_amount: 10_000.0,
		loan_purpose: "car".to_string(),
		tenure: 36,
		interest_rate: 0.1,
		credit_score: 600,
		previous_defaults: 0,
		debt_to_income_ratio: 0.3,
	}
}

pub struct BorrowerFactory {
	pool: SqlitePool,
}

impl BorrowerFactory {
	fn new(pool: SqlitePool) -> Self {
		BorrowerFactory { pool }
	}

	pub fn bob(&self) -> Borrower {
		borrower::Repo::new(self.pool.clone())
			.create(NewBorrower {
				full_name: "Bob Roberts",
				age: 34,
				gender: "Male",
				income: 48_000.0,
				employment_status: "Employed",
				employment_duration: 60,
				housing_status: "Rent",
			})
			.unwrap()
	}

	pub fn lucy(&self) -> Borrower {
		borrower::Repo::new(self.pool.clone())
			.create(NewBorrower {
				full_name: "Lucy Luke",
				age: 41,
				gender: "Female",
				income: 72_000.0,
				employment_status: "Employed",
				employment_duration: 130,
				housing_status: "Own",
			})
			.unwrap()
	}
}

pub struct ApplicationFactory {
	pool: SqlitePool,
}

impl ApplicationFactory {
	fn new(pool: SqlitePool) -> Self {
		ApplicationFactory { pool }
	}

	pub fn car_loan(&self, borrower_id: i32) -> LoanApplication {
		application::Repo::new(self.pool.clone())
			.create(NewApplication {
				borrower_id,
				loan_amount: 10_000.0,
				loan_purpose: "car",
				tenure: 36,
				interest_rate: 0.1,
				credit_score: 600,
				previous_defaults: 0,
				debt_to_income_ratio: 0.3,
				status: Default::default(),
			})
			.unwrap()
	}
}
