use credit_risk_api::application::ApplicationStatus;

use crate::common::{Fixture, Suite};

#[test]
fn create_application_defaults_to_pending() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);

	let bob = f.borrower_factory.bob();
	let application = f.application_factory.car_loan(bob.id);

	assert_eq!(application.borrower_id, bob.id);
	assert_eq!(application.status, ApplicationStatus::Pending);

	let found = suite.application_repo.find_by_id(application.id).unwrap();
	assert_eq!(found, application);
}

#[test]
fn set_status() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);

	let bob = f.borrower_factory.bob();
	let application = f.application_factory.car_loan(bob.id);

	let updated = suite
		.application_repo
		.set_status(application.id, ApplicationStatus::Approved)
		.unwrap();
	assert_eq!(updated.status, ApplicationStatus::Approved);
}

#[test]
fn find_by_borrower_only_returns_their_applications() {
	let f = Fixture::new();
	let suite = Suite::setup(&f);

	let bob = f.borrower_factory.bob();
	let lucy = f.borrower_factory.lucy();
	f.application_factory.car_loan(bob.id);
	f.application_factory.car_loan(bob.id);
	f.application_factory.car_loan(lucy.id);

	let bobs = suite.application_repo.find_by_borrower(bob.id).unwrap();
	assert_eq!(bobs.len(), 2);
	assert!(bobs.iter().all(|a| a.borrower_id == bob.id));
}
