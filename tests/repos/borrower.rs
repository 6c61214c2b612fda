use credit_risk_api::borrower::NewBorrower;
use credit_risk_api::db;

use crate::common::{Fixture, Suite};

#[test]
fn create_borrower() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);

	let created = suite
		.borrower_repo
		.create(NewBorrower {
			full_name: "Tom Riddle",
			age: 29,
			gender: "Male",
			income: 39_500.0,
			employment_status: "Employed",
			employment_duration: 18,
			housing_status: "Rent",
		})
		.unwrap();

	let found = suite.borrower_repo.find_by_id(created.id).unwrap();
	assert_eq!(found, created);
	assert_eq!(found.employment_status, "Employed");
}

#[test]
fn find_missing_borrower() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);

	let got_err = suite.borrower_repo.find_by_id(404).unwrap_err();
	assert_eq!(got_err, db::Error::RecordNotFound);
}
