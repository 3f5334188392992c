//! Metrics server module
//!
//! HTTP surface for scrapers and humans: Prometheus text on `/metrics`, a liveness
//! probe on `/health`, the latest snapshot as JSON on `/api/snapshot` and a static
//! page on `/`. Handlers only read; collection happens elsewhere.

use actix_web::middleware::{Compress, DefaultHeaders, NormalizePath};
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use tracing::{error, info};

use crate::{services::sink::SnapshotStore, utils::metrics::ExporterMetrics};

const DASHBOARD_HTML: &str = include_str!("dashboard.html");
const DEFAULT_DOCKER_PORT: &str = "8080";

/// Metrics endpoint handler
async fn metrics_handler(metrics: web::Data<ExporterMetrics>) -> impl Responder {
	match metrics.gather() {
		Ok(buffer) => HttpResponse::Ok()
			.content_type("text/plain; version=0.0.4; charset=utf-8")
			.body(buffer),
		Err(e) => {
			error!("Error gathering metrics: {}", e);
			HttpResponse::InternalServerError().finish()
		}
	}
}

async fn health_handler() -> impl Responder {
	HttpResponse::Ok().content_type("text/plain").body("OK")
}

async fn dashboard_handler() -> impl Responder {
	HttpResponse::Ok()
		.content_type("text/html; charset=utf-8")
		.body(DASHBOARD_HTML)
}

async fn snapshot_handler(store: web::Data<SnapshotStore>) -> impl Responder {
	let snapshot = store.latest().await;
	HttpResponse::Ok().json(snapshot.as_ref())
}

/// Registers every route on an actix service config.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("/metrics", web::get().to(metrics_handler))
		.route("/health", web::get().to(health_handler))
		.route("/api/snapshot", web::get().to(snapshot_handler))
		.route("/", web::get().to(dashboard_handler));
}

/// Rewrites the host part to `0.0.0.0` when running inside a container.
fn resolve_bind_address(bind_address: &str, in_docker: bool) -> String {
	if !in_docker {
		return bind_address.to_string();
	}
	match bind_address.rsplit_once(':') {
		Some((_, port)) if !port.is_empty() => format!("0.0.0.0:{}", port),
		_ => format!("0.0.0.0:{}", DEFAULT_DOCKER_PORT),
	}
}

/// Creates the scrape server.
///
/// # Arguments
/// * `bind_address` - `host:port` to listen on; rewritten to `0.0.0.0` when `IN_DOCKER=true`
/// * `metrics` - Registry gathered on every scrape
/// * `store` - Snapshot store read by `/api/snapshot`
///
/// # Returns
/// A running server handle; awaiting it drives the server until it stops
pub fn create_metrics_server(
	bind_address: String,
	metrics: ExporterMetrics,
	store: SnapshotStore,
) -> std::io::Result<actix_web::dev::Server> {
	let in_docker = std::env::var("IN_DOCKER").unwrap_or_default() == "true";
	let actual_bind_address = resolve_bind_address(&bind_address, in_docker);

	info!(
		"Starting metrics server on {} (actual bind: {})",
		bind_address, actual_bind_address
	);

	let metrics = web::Data::new(metrics);
	let store = web::Data::new(store);

	Ok(HttpServer::new(move || {
		App::new()
			.wrap(Compress::default())
			.wrap(NormalizePath::trim())
			.wrap(DefaultHeaders::new())
			.app_data(metrics.clone())
			.app_data(store.clone())
			.configure(configure_routes)
	})
	.workers(2)
	.bind(actual_bind_address)?
	.shutdown_timeout(5)
	.run())
}
