use std::str::FromStr;

use diesel::backend::Backend;
use diesel::{
	deserialize::{self, FromSql},
	prelude::*,
	serialize,
	serialize::{IsNull, Output, ToSql},
	sql_types::Text,
};
use diesel::sqlite::Sqlite;
use strum_macros::{Display, EnumString};

use crate::borrower::Borrower;
use crate::db;
use crate::schema::loan_applications;
use crate::types::{Id, Time};

#[derive(Queryable, Identifiable, Associations, Debug, PartialEq)]
#[diesel(table_name = loan_applications, belongs_to(Borrower))]
pub struct LoanApplication {
	pub id: Id,
	pub borrower_id: Id,
	pub loan_amount: f64,
	pub loan_purpose: String,
	pub tenure: i32,
	pub interest_rate: f64,
	pub credit_score: i32,
	pub previous_defaults: i32,
	pub debt_to_income_ratio: f64,
	pub status: ApplicationStatus,
	pub created_at: Time,
}

#[derive(Insertable)]
#[diesel(table_name = loan_applications)]
pub struct NewApplication<'a> {
	pub borrower_id: Id,
	pub loan_amount: f64,
	pub loan_purpose: &'a str,
	pub tenure: i32,
	pub interest_rate: f64,
	pub credit_score: i32,
	pub previous_defaults: i32,
	pub debt_to_income_ratio: f64,
	pub status: ApplicationStatus,
}

/// Lifecycle of a loan application; scoring leaves it pending, downstream
/// review processes move it to approved or rejected
#[derive(Debug, Clone, Copy, AsExpression, FromSqlRow, Eq, PartialEq, EnumString, Display)]
#[diesel(sql_type = Text)]
#[strum(serialize_all = "snake_case")]
pub enum ApplicationStatus {
	Pending,
	Approved,
	Rejected,
}

impl Default for ApplicationStatus {
	fn default() -> Self {
		ApplicationStatus::Pending
	}
}

impl ToSql<Text, Sqlite> for ApplicationStatus {
	fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
		out.set_value(self.to_string());
		Ok(IsNull::No)
	}
}

impl FromSql<Text, Sqlite> for ApplicationStatus {
	fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
		let s = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;

		Ok(ApplicationStatus::from_str(&s)?)
	}
}

pub struct Repo {
	db: db::SqlitePool,
}

impl Repo {
	pub fn new(db: db::SqlitePool) -> Self {
		Repo { db }
	}

	pub fn create(&self, new_application: NewApplication) -> db::Result<LoanApplication> {
		let conn = &mut self.db.get()?;
		diesel::insert_into(loan_applications::table)
			.values(&new_application)
			.get_result(conn)
			.map_err(Into::into)
	}

	pub fn find_by_id(&self, id: Id) -> db::Result<LoanApplication> {
		let conn = &mut self.db.get()?;
		loan_applications::table
			.find(id)
			.select(loan_applications::all_columns)
			.first(conn)
			.map_err(Into::into)
	}

	pub fn find_by_borrower(&self, borrower_id: Id) -> db::Result<Vec<LoanApplication>> {
		let conn = &mut self.db.get()?;
		loan_applications::table
			.filter(loan_applications::borrower_id.eq(borrower_id))
			.select(loan_applications::all_columns)
			.load(conn)
			.map_err(Into::into)
	}

	pub fn set_status(&self, id: Id, status: ApplicationStatus) -> db::Result<LoanApplication> {
		let conn = &mut self.db.get()?;
		diesel::update(loan_applications::table)
			.filter(loan_applications::id.eq(id))
			.set(loan_applications::status.eq(status))
			.get_result(conn)
			.map_err(Into::into)
	}
}
