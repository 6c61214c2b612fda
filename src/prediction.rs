use diesel::prelude::*;

use crate::application::LoanApplication;
use crate::db;
use crate::policy::RiskLevel;
use crate::schema::prediction_history;
use crate::types::{Id, Time};

/// Persisted outcome of one classifier run; append-only, never mutated
#[derive(Queryable, Identifiable, Associations, Debug, PartialEq)]
#[diesel(table_name = prediction_history, belongs_to(LoanApplication, foreign_key = application_id))]
pub struct PredictionRecord {
	pub id: Id,
	pub application_id: Id,
	pub probability: f64,
	pub risk_level: RiskLevel,
	pub prediction: bool,
	/// Full attribution list as JSON, not just the response's top five
	pub feature_importance: String,
	pub model_version: String,
	pub created_at: Time,
}

#[derive(Insertable)]
#[diesel(table_name = prediction_history)]
pub struct NewPrediction<'a> {
	pub application_id: Id,
	pub probability: f64,
	pub risk_level: RiskLevel,
	pub prediction: bool,
	pub feature_importance: &'a str,
	pub model_version: &'a str,
}

pub struct Repo {
	db: db::SqlitePool,
}

impl Repo {
	pub fn new(db: db::SqlitePool) -> Self {
		Repo { db }
	}

	pub fn create(&self, new_prediction: NewPrediction) -> db::Result<PredictionRecord> {
		let conn = &mut self.db.get()?;
		diesel::insert_into(prediction_history::table)
			.values(&new_prediction)
			.get_result(conn)
			.map_err(Into::into)
	}

	pub fn find_by_application(&self, application_id: Id) -> db::Result<PredictionRecord> {
		let conn = &mut self.db.get()?;
		prediction_history::table
			.filter(prediction_history::application_id.eq(application_id))
			.select(prediction_history::all_columns)
			.first(conn)
			.map_err(Into::into)
	}

	/// Most recent predictions first; id breaks ties within one timestamp
	pub fn recent(&self, limit: i64) -> db::Result<Vec<PredictionRecord>> {
		let conn = &mut self.db.get()?;
		prediction_history::table
			.order((
				prediction_history::created_at.desc(),
				prediction_history::id.desc(),
			))
			.limit(limit)
			.select(prediction_history::all_columns)
			.load(conn)
			.map_err(Into::into)
	}
}
