use axum::{routing::get, Router};
use axum_prometheus::PrometheusMetricLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use echoscrape::config::Config;
use echoscrape::handlers;
use echoscrape::pipeline::Scraper;
use echoscrape::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing — JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("echoscrape=info,tower_http=info"));

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 echoscrape starting...");

    let config = Config::from_env();
    info!(
        timeout_secs = config.fetch_timeout.as_secs(),
        max_body_bytes = config.max_body_bytes,
        "📝 Configuration loaded"
    );

    let scraper = Scraper::from_config(&config).expect("Failed to build HTTP client");
    let app_state = AppState { scraper };

    // Public metadata API: any origin may call it.
    let cors = CorsLayer::permissive();

    // Prometheus metrics layer
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = Router::new()
        .route("/", get(handlers::index))
        // Health check + metrics, under a prefix no target host can take
        .route("/_/health", get(handlers::health_check))
        .route(
            "/_/metrics",
            get(move || async move { metric_handle.render() }),
        )
        // Everything else is a target URL
        .route("/*target", get(handlers::metadata::get_metadata))
        // Middleware
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    let addr = config.server_addr();
    info!("🎧 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
