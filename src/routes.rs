use axum::{
    http::{header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::handlers::{cluster_handler, health_handler};
use crate::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler::health_check))
        .route("/create", post(cluster_handler::create_cluster))
        .route("/status/:id", get(cluster_handler::get_status))
        .route("/prolong/:id", post(cluster_handler::prolong_missing_minutes))
        .route("/prolong/:id/:minutes", post(cluster_handler::prolong_cluster))
        .route("/reconcile", post(cluster_handler::reconcile))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                // CorsLayer only answers requests carrying an Origin header
                .layer(SetResponseHeaderLayer::if_not_present(
                    ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static("*"),
                )),
        )
        .with_state(state)
}
