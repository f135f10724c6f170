use std::future::Future;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::api::fields as field_handlers;
use super::api::messages as message_handlers;
use super::api::plot as plot_handlers;
use super::api::status as status_handlers;
use super::api_doc::ApiDoc;
use super::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/status", get(status_handlers::status))
        // Field subscriptions
        .route(
            "/api/fields",
            get(field_handlers::list_fields)
                .post(field_handlers::add_field)
                .delete(field_handlers::remove_field),
        )
        .route("/api/fields/clear", post(field_handlers::clear_field))
        .route("/api/fields/ylim", put(field_handlers::set_y_limits))
        .route("/api/fields/visibility", put(field_handlers::set_visibility))
        // Plot and map
        .route("/api/window", put(plot_handlers::set_time_limit))
        .route("/api/window/range", put(plot_handlers::set_range))
        .route("/api/plot", get(plot_handlers::plot_frame))
        .route("/api/cursor", get(plot_handlers::cursor))
        .route("/api/layers", get(plot_handlers::layers))
        .route("/api/messages", post(message_handlers::publish))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server<F>(bind_addr: &str, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
