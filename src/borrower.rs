use diesel::prelude::*;

use crate::db;
use crate::schema::borrowers;
use crate::types::{Id, Time};

#[derive(Queryable, Identifiable, Debug, PartialEq)]
#[diesel(table_name = borrowers)]
pub struct Borrower {
	pub id: Id,
	pub full_name: String,
	pub age: i32,
	pub gender: String,
	pub income: f64,
	pub employment_status: String,
	pub employment_duration: i32,
	pub housing_status: String,
	pub created_at: Time,
}

#[derive(Insertable)]
#[diesel(table_name = borrowers)]
pub struct NewBorrower<'a> {
	pub full_name: &'a str,
	pub age: i32,
	pub gender: &'a str,
	pub income: f64,
	pub employment_status: &'a str,
	pub employment_duration: i32,
	pub housing_status: &'a str,
}

pub struct Repo {
	db: db::SqlitePool,
}

impl Repo {
	pub fn new(db: db::SqlitePool) -> Self {
		Repo { db }
	}

	pub fn create(&self, new_borrower: NewBorrower) -> db::Result<Borrower> {
		let conn = &mut self.db.get()?;
		diesel::insert_into(borrowers::table)
			.values(&new_borrower)
			.get_result(conn)
			.map_err(Into::into)
	}

	pub fn find_by_id(&self, id: Id) -> db::Result<Borrower> {
		let conn = &mut self.db.get()?;
		borrowers::table
			.find(id)
			.select(borrowers::all_columns)
			.first(conn)
			.map_err(Into::into)
	}
}
