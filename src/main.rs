use std::env;
use std::sync::Arc;

use dotenv::dotenv;
use log::*;
use warp::filters::log::Info;
use warp::Filter;

use credit_risk_api::{api, db, ModelStore};

#[tokio::main]
async fn main() {
	dotenv().ok();
	if env::var("RUST_LOG").is_err() {
		env::set_var("RUST_LOG", "info");
	}
	pretty_env_logger::init();

	let pool = db::connection_pool();
	{
		let mut conn = pool.get().expect("get a db connection");
		db::run_migrations(&mut conn).expect("apply database migrations");
	}

	let models = Arc::new(ModelStore::from_env());
	// a missing artifact is not fatal at startup; /predict reports it per request
	let _ = models.ensure_loaded();

	let log = warp::log::custom(|info: Info| {
		info!(
			target: "risk::api",
			"\"{} {} {:?}\" \t{} {} {:?}",
			info.method(),
			info.path(),
			info.version(),
			info.status().canonical_reason().unwrap_or_else(|| "-"),
			info.status().as_u16(),
			info.elapsed(),
		);
	});

	let routes = api::routes(api::Context { pool, models })
		.recover(api::handle_rejection)
		.with(log);

	let port: u16 = env::var("PORT")
		.ok()
		.and_then(|p| p.parse().ok())
		.unwrap_or(8001);
	info!(target: "risk::api", "listening on 0.0.0.0:{}", port);
	warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}
