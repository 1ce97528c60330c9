use crate::advice::AdviceContext;
use crate::api::AppState;
use crate::calculators::{self, BmiReport, Gender, Relative};
use crate::error::{AppError, Result};
use crate::explain::{Explanation, FeatureImportance};
use crate::ml::classifier::ClassifierInfo;
use crate::ml::features::FeatureVectorBuilder;
use crate::ml::metrics::{self, ModelPerformance};
use crate::ml::{PredictionService, ReferenceDataset, RiskClassifier};
use crate::models::{
    HistoryRecord, MedicalInput, PersistenceStatus, PredictionReport, RiskLabel, UserId,
};
use crate::trackers::{MealEntry, NewMeal, NewReading, SugarReading, SugarSummary};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Header carrying the authenticated user's identifier
const USER_HEADER: &str = "x-user-email";

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        prediction_available: state.prediction.is_some(),
        explanation_available: state.explanation.is_some(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub prediction_available: bool,
    pub explanation_available: bool,
}

/// Query parameters shared by user-scoped endpoints
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub user: Option<String>,
}

/// Resolve the user identifier from header or query. Absence is a
/// precondition failure; there is no default user.
fn require_user(headers: &HeaderMap, query: &UserQuery) -> Result<UserId> {
    if let Some(value) = headers.get(USER_HEADER) {
        let raw = value.to_str().map_err(|_| {
            AppError::Authentication("user identifier header is not valid UTF-8".to_string())
        })?;
        return UserId::new(raw);
    }
    if let Some(ref raw) = query.user {
        return UserId::new(raw.clone());
    }
    Err(AppError::Authentication(
        "missing user identifier".to_string(),
    ))
}

fn require_prediction(state: &AppState) -> Result<Arc<PredictionService>> {
    state.prediction.clone().ok_or_else(|| {
        AppError::ModelUnavailable(
            "risk prediction is temporarily disabled: classifier artifact not loaded".to_string(),
        )
    })
}

fn require_classifier(state: &AppState) -> Result<Arc<RiskClassifier>> {
    state.classifier.clone().ok_or_else(|| {
        AppError::ModelUnavailable(
            "risk prediction is temporarily disabled: classifier artifact not loaded".to_string(),
        )
    })
}

fn require_dataset(state: &AppState) -> Result<Arc<ReferenceDataset>> {
    state.dataset.clone().ok_or_else(|| {
        AppError::Dataset("reference dataset not loaded".to_string())
    })
}

/// Medical input payload with the intake-form bounds. The feature vector
/// builder re-validates the same bounds defensively.
#[derive(Debug, Deserialize, Validate)]
pub struct MedicalInputRequest {
    #[validate(range(max = 20))]
    pub pregnancies: u32,

    #[validate(range(max = 200))]
    pub glucose: u32,

    #[validate(range(max = 150))]
    pub blood_pressure: u32,

    #[validate(range(max = 100))]
    pub skin_thickness: u32,

    #[validate(range(max = 900))]
    pub insulin: u32,

    #[validate(range(min = 0.0, max = 67.0))]
    pub bmi: f64,

    #[validate(range(min = 0.0, max = 2.5))]
    pub diabetes_pedigree_function: f64,

    #[validate(range(min = 1, max = 120))]
    pub age: u32,
}

impl From<&MedicalInputRequest> for MedicalInput {
    fn from(request: &MedicalInputRequest) -> Self {
        MedicalInput {
            pregnancies: request.pregnancies,
            glucose: request.glucose,
            blood_pressure: request.blood_pressure,
            skin_thickness: request.skin_thickness,
            insulin: request.insulin,
            bmi: request.bmi,
            diabetes_pedigree_function: request.diabetes_pedigree_function,
            age: request.age,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub label: RiskLabel,
    pub message: &'static str,
    pub probability: f64,
    pub risk_percent: f64,
    pub model_version: String,
    pub created_at: String,
    pub saved: bool,
    /// Set when the prediction succeeded but was not durably saved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<PredictionReport> for PredictResponse {
    fn from(report: PredictionReport) -> Self {
        let warning = match &report.persistence {
            PersistenceStatus::Saved => None,
            PersistenceStatus::Failed { reason } => Some(format!(
                "Your prediction was computed but could not be saved to history: {}",
                reason
            )),
        };
        let saved = report.is_saved();
        let result = report.result;
        PredictResponse {
            label: result.label,
            message: result.label.message(),
            probability: result.probability,
            risk_percent: result.risk_percent,
            model_version: result.model_version,
            created_at: result.created_at.to_rfc3339(),
            saved,
            warning,
        }
    }
}

/// Run a risk prediction and append it to the user's history
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
    Json(request): Json<MedicalInputRequest>,
) -> Result<Json<PredictResponse>> {
    let user = require_user(&headers, &query)?;
    let service = require_prediction(&state)?;
    request.validate()?;

    let input = MedicalInput::from(&request);
    let report = service.predict(&input, &user).await?;
    Ok(Json(PredictResponse::from(report)))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub records: Vec<HistoryRecord>,
    pub total: usize,
}

/// List a user's prediction history, most recent first
pub async fn history_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<Json<HistoryResponse>> {
    let user = require_user(&headers, &query)?;
    let records = state.history.list(&user).await?;
    let total = records.len();
    Ok(Json(HistoryResponse { records, total }))
}

/// Irreversibly delete a user's prediction history
pub async fn history_clear(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<StatusCode> {
    let user = require_user(&headers, &query)?;
    state.history.clear(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Download a user's history as CSV
pub async fn history_export(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<impl axum::response::IntoResponse> {
    let user = require_user(&headers, &query)?;
    let bytes = state.history.export_csv(&user).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"prediction_history.csv\"",
            ),
        ],
        bytes,
    ))
}

/// Explain one input's prediction with per-feature attributions
pub async fn explain(
    State(state): State<AppState>,
    Json(request): Json<MedicalInputRequest>,
) -> Result<Json<Explanation>> {
    let engine = state.explanation.clone().ok_or_else(|| {
        AppError::Dataset(
            "explanations are unavailable: classifier or reference dataset not loaded".to_string(),
        )
    })?;
    request.validate()?;

    let input = MedicalInput::from(&request);
    let vector = FeatureVectorBuilder::build(&input)?;
    let explanation = engine.explain(&vector)?;
    Ok(Json(explanation))
}

/// Metadata about the loaded classifier
pub async fn model_info(State(state): State<AppState>) -> Result<Json<ClassifierInfo>> {
    let classifier = require_classifier(&state)?;
    Ok(Json(classifier.info()))
}

/// Model quality over the reference dataset
pub async fn model_performance(State(state): State<AppState>) -> Result<Json<ModelPerformance>> {
    let classifier = require_classifier(&state)?;
    let dataset = require_dataset(&state)?;
    let performance = metrics::evaluate(&classifier, &dataset)?;
    Ok(Json(performance))
}

#[derive(Debug, Deserialize)]
pub struct ImportanceQuery {
    pub n_repeats: Option<usize>,
}

/// Permutation feature importance over the reference dataset
pub async fn model_importance(
    State(state): State<AppState>,
    Query(query): Query<ImportanceQuery>,
) -> Result<Json<Vec<FeatureImportance>>> {
    let engine = state.explanation.clone().ok_or_else(|| {
        AppError::Dataset(
            "feature importance is unavailable: classifier or reference dataset not loaded"
                .to_string(),
        )
    })?;
    let importances = engine.permutation_importance(query.n_repeats.unwrap_or(5))?;
    Ok(Json(importances))
}

/// Log a meal
pub async fn meals_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
    Json(request): Json<NewMeal>,
) -> Result<(StatusCode, Json<MealEntry>)> {
    let user = require_user(&headers, &query)?;
    let entry = state.meals.add(&user, request)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// List logged meals, most recent first
pub async fn meals_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<MealEntry>>> {
    let user = require_user(&headers, &query)?;
    Ok(Json(state.meals.list(&user)?))
}

#[derive(Debug, Deserialize)]
pub struct MealSummaryQuery {
    pub user: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Calorie totals for one day (today in the configured zone by default)
pub async fn meals_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MealSummaryQuery>,
) -> Result<Json<crate::trackers::meals::MealDaySummary>> {
    let user_query = UserQuery { user: query.user.clone() };
    let user = require_user(&headers, &user_query)?;
    let date = query
        .date
        .unwrap_or_else(|| chrono::Utc::now().with_timezone(&state.time_zone).date_naive());
    Ok(Json(state.meals.daily_summary(&user, date)?))
}

/// Delete all of a user's meal entries
pub async fn meals_clear(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<StatusCode> {
    let user = require_user(&headers, &query)?;
    state.meals.clear(&user)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Log a blood-sugar reading
pub async fn sugar_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
    Json(request): Json<NewReading>,
) -> Result<(StatusCode, Json<SugarReading>)> {
    let user = require_user(&headers, &query)?;
    let entry = state.sugar.add(&user, request)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// List blood-sugar readings, most recent first
pub async fn sugar_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<SugarReading>>> {
    let user = require_user(&headers, &query)?;
    Ok(Json(state.sugar.list(&user)?))
}

/// Aggregate statistics over a user's readings
pub async fn sugar_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<Json<SugarSummary>> {
    let user = require_user(&headers, &query)?;
    Ok(Json(state.sugar.summary(&user)?))
}

/// Delete all of a user's sugar readings
pub async fn sugar_clear(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<StatusCode> {
    let user = require_user(&headers, &query)?;
    state.sugar.clear(&user)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub advice: String,
}

/// Generate personalised advice. Context is enriched from the user's
/// latest prediction and sugar log when available; the generator itself
/// always answers (static fallback).
pub async fn advice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
    Json(request): Json<AdviceRequest>,
) -> Result<Json<AdviceResponse>> {
    let user = require_user(&headers, &query)?;
    if request.question.trim().is_empty() {
        return Err(AppError::validation("question", "must not be empty"));
    }

    let risk_percent = state
        .history
        .list(&user)
        .await
        .ok()
        .and_then(|records| records.first().map(|r| r.risk_percent));
    let mean_glucose = state
        .sugar
        .summary(&user)
        .ok()
        .map(|summary| summary.mean_mg_dl);

    let context = AdviceContext {
        question: request.question,
        risk_percent,
        mean_glucose_mg_dl: mean_glucose,
    };

    let advice = state.advice.generate(&context).await?;
    Ok(Json(AdviceResponse { advice }))
}

#[derive(Debug, Deserialize)]
pub struct BmiRequest {
    pub weight_kg: f64,
    pub height_cm: f64,
}

/// BMI calculator
pub async fn calculator_bmi(Json(request): Json<BmiRequest>) -> Result<Json<BmiReport>> {
    Ok(Json(calculators::bmi(request.weight_kg, request.height_cm)?))
}

#[derive(Debug, Deserialize)]
pub struct PedigreeRequest {
    pub family: Vec<Relative>,
}

#[derive(Debug, Serialize)]
pub struct PedigreeResponse {
    pub diabetes_pedigree_function: f64,
}

/// Diabetes-pedigree estimate from family history
pub async fn calculator_pedigree(
    Json(request): Json<PedigreeRequest>,
) -> Result<Json<PedigreeResponse>> {
    let dpf = calculators::pedigree_estimate(&request.family)?;
    Ok(Json(PedigreeResponse {
        diabetes_pedigree_function: dpf,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CaloriesRequest {
    pub gender: Gender,
    pub age_years: f64,
    pub weight_kg: f64,
    pub heart_rate_bpm: f64,
    pub duration_min: f64,
}

#[derive(Debug, Serialize)]
pub struct CaloriesResponse {
    pub calories_burned: f64,
}

/// Calorie-burn estimate for an exercise session
pub async fn calculator_calories(
    Json(request): Json<CaloriesRequest>,
) -> Result<Json<CaloriesResponse>> {
    let kcal = calculators::calories_burned(
        request.gender,
        request.age_years,
        request.weight_kg,
        request.heart_rate_bpm,
        request.duration_min,
    )?;
    Ok(Json(CaloriesResponse {
        calories_burned: kcal,
    }))
}
