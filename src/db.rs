use std::{env, fmt};

use diesel::connection::SimpleConnection;
use diesel::r2d2::ConnectionManager;
use diesel::result::DatabaseErrorKind::UniqueViolation;
use diesel::result::Error::{DatabaseError, NotFound};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use dotenv::dotenv;
use r2d2;

pub type Result<T> = std::result::Result<T, Error>;
pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Get a pooled connection to the underlying SQLite database
///
/// `DATABASE_URL` may be set in the environment; defaults to `credit_risk.db`
/// Loads `.env` file in the environment's directory
pub fn connection_pool() -> SqlitePool {
	dotenv().ok();
	let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "credit_risk.db".to_string());

	pool(&database_url)
}

/// Build a pool for an explicit database path
pub fn pool(database_url: &str) -> SqlitePool {
	let manager = ConnectionManager::<SqliteConnection>::new(database_url);
	let pool = r2d2::Pool::builder()
		.connection_customizer(Box::new(ConnectionOptions))
		.build(manager)
		.expect("Failed to create pool.");

	pool
}

/// Apply pending migrations; the schema equivalent of the original init-on-startup
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
	conn.run_pending_migrations(MIGRATIONS)
		.map(|_| ())
		.map_err(|e| Error::Migration(e.to_string()))
}

#[derive(Debug)]
struct ConnectionOptions;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
	fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
		conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 1000;")
			.map_err(diesel::r2d2::Error::QueryError)
	}
}

/// Error that can occur when querying against the database
#[derive(Debug)]
pub enum Error {
	RecordAlreadyExists,
	RecordNotFound,
	Connection(String),
	Migration(String),
	/// Used as a catch-all for the remaining diesel failures
	DatabaseError(diesel::result::Error),
}

impl PartialEq for Error {
	fn eq(&self, other: &Error) -> bool {
		match (self, other) {
			(Error::RecordAlreadyExists, Error::RecordAlreadyExists) => true,
			(Error::RecordNotFound, Error::RecordNotFound) => true,
			(Error::Connection(a), Error::Connection(b)) => a == b,
			(Error::Migration(a), Error::Migration(b)) => a == b,
			(Error::DatabaseError(a), Error::DatabaseError(b)) => a.to_string() == b.to_string(),
			_ => false,
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::RecordAlreadyExists => write!(f, "record violates a unique constraint"),
			Error::RecordNotFound => write!(f, "record does not exist"),
			Error::Connection(e) => write!(f, "opening database connection: {}", e),
			Error::Migration(e) => write!(f, "running migrations: {}", e),
			Error::DatabaseError(e) => write!(f, "database error: {:?}", e),
		}
	}
}

impl std::error::Error for Error {}

impl From<diesel::result::Error> for Error {
	fn from(e: diesel::result::Error) -> Self {
		match e {
			DatabaseError(UniqueViolation, _) => Error::RecordAlreadyExists,
			NotFound => Error::RecordNotFound,

			_ => Error::DatabaseError(e),
		}
	}
}

impl From<r2d2::Error> for Error {
	fn from(e: r2d2::Error) -> Self {
		Error::Connection(e.to_string())
	}
}
