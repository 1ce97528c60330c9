use diabetes_health_manager::{
    advice::create_advice_generator,
    api::{build_router, AppState},
    config::Config,
    explain::ExplanationEngine,
    ml::{PredictionService, ReferenceDataset, RiskClassifier},
    state::create_history_store,
    trackers::{MealLog, SugarLog},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diabetes_health_manager=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    tracing::info!(
        "Starting Diabetes Health Manager v{}",
        env!("CARGO_PKG_VERSION")
    );

    let time_zone = config.application.time_zone()?;
    tracing::info!(time_zone = %time_zone, "Deployment time zone configured");

    // Initialize history backend
    tracing::info!(backend = ?config.history.backend, "History backend");
    let history = create_history_store(&config.history)?;
    tracing::info!("History store initialized");

    // Initialize trackers
    let meals = Arc::new(MealLog::new(&config.trackers.path)?);
    let sugar = Arc::new(SugarLog::new(&config.trackers.path)?);
    tracing::info!(path = ?config.trackers.path, "Trackers initialized");

    // Load the classifier artifact. A failure disables the
    // prediction-dependent endpoints but never prevents startup: history
    // and trackers must stay usable.
    let classifier = match RiskClassifier::load(&config.model.artifact_path) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(e) => {
            tracing::error!(error = %e, "Classifier artifact missing or corrupt");
            tracing::warn!("Risk prediction and explanation endpoints are disabled");
            None
        }
    };

    // Load the reference dataset backing explanations and performance
    let dataset = match config.model.reference_data_path {
        Some(ref path) => match ReferenceDataset::load(path) {
            Ok(dataset) => Some(Arc::new(dataset)),
            Err(e) => {
                tracing::warn!(error = %e, "Reference dataset unavailable");
                tracing::warn!("Explanation and performance endpoints are disabled");
                None
            }
        },
        None => {
            tracing::warn!("No reference dataset configured");
            None
        }
    };

    let prediction = classifier
        .clone()
        .map(|c| Arc::new(PredictionService::new(c, history.clone(), time_zone)));

    let explanation = match (classifier.clone(), dataset.clone()) {
        (Some(classifier), Some(dataset)) => {
            Some(Arc::new(ExplanationEngine::new(classifier, dataset)))
        }
        _ => None,
    };

    let advice = create_advice_generator(&config.advice);

    let state = AppState {
        prediction,
        classifier,
        explanation,
        dataset,
        history,
        meals,
        sugar,
        advice,
        time_zone,
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = server => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
