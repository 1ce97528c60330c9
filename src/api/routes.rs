use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health_check))
        // Risk prediction
        .route("/v1/predictions", post(handlers::predict))
        // Prediction history
        .route(
            "/v1/history",
            get(handlers::history_list).delete(handlers::history_clear),
        )
        .route("/v1/history/export", get(handlers::history_export))
        // Explanations and model insight
        .route("/v1/explanations", post(handlers::explain))
        .route("/v1/model", get(handlers::model_info))
        .route("/v1/model/performance", get(handlers::model_performance))
        .route("/v1/model/importance", get(handlers::model_importance))
        // Meal tracker
        .route(
            "/v1/meals",
            post(handlers::meals_add)
                .get(handlers::meals_list)
                .delete(handlers::meals_clear),
        )
        .route("/v1/meals/summary", get(handlers::meals_summary))
        // Sugar tracker
        .route(
            "/v1/sugar",
            post(handlers::sugar_add)
                .get(handlers::sugar_list)
                .delete(handlers::sugar_clear),
        )
        .route("/v1/sugar/summary", get(handlers::sugar_summary))
        // Advice
        .route("/v1/advice", post(handlers::advice))
        // Calculators
        .route("/v1/calculators/bmi", post(handlers::calculator_bmi))
        .route("/v1/calculators/pedigree", post(handlers::calculator_pedigree))
        .route("/v1/calculators/calories", post(handlers::calculator_calories))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
}
