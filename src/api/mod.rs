use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{
    ApiResponse, LeagueStatRecord, MatchStatRecord, ModelStatus, PlayerStatRecord,
    PredictionRequest, PredictionResponse, TeamInfo, View, ViewInfo, TEAMS,
};
use crate::services::{interpret, ModelRegistry, PredictError, PredictionEngine};
use crate::utils::{sample_league_table, LogoResolver, SampleRow, LOGO_ROUTE};

#[derive(Clone)]
pub struct AppState {
    pub engine: PredictionEngine,
    pub logos: LogoResolver,
}

type ApiError = (StatusCode, Json<ApiResponse<()>>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let registry = ModelRegistry::load(&config.models);
    let state = AppState {
        engine: PredictionEngine::new(Arc::new(registry)),
        logos: LogoResolver::new(config.logo_dir.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!("PitchCast API server listening on port {}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    let logo_dir = state.logos.dir().to_path_buf();

    Router::new()
        .route("/health", get(health_check))
        .route("/teams", get(list_teams_handler))
        .route("/views", get(list_views_handler))
        .route("/views/{view}/defaults", get(view_defaults_handler))
        .route("/models", get(model_status_handler))
        .route("/league/sample", get(sample_league_handler))
        .route("/predict", post(predict_handler))
        .route("/predict/goals", post(predict_goals_handler))
        .route("/predict/match", post(predict_match_handler))
        .route("/predict/league", post(predict_league_handler))
        .nest_service(LOGO_ROUTE, ServeDir::new(logo_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("PitchCast API is running"))
}

// GET /teams - Team enumeration with logo locations
async fn list_teams_handler(State(state): State<AppState>) -> Json<ApiResponse<Vec<TeamInfo>>> {
    let teams = TEAMS
        .iter()
        .map(|team| TeamInfo {
            name: team.to_string(),
            logo: state.logos.resolve(team),
        })
        .collect();
    Json(ApiResponse::success(teams))
}

// GET /views - The three prediction views, default first
async fn list_views_handler() -> Json<ApiResponse<Vec<ViewInfo>>> {
    let views = View::ALL
        .into_iter()
        .map(|view| ViewInfo {
            view,
            title: view.title().to_string(),
            is_default: view == View::default(),
        })
        .collect();
    Json(ApiResponse::success(views))
}

// GET /views/{view}/defaults - Form defaults for a view
async fn view_defaults_handler(Path(view): Path<String>) -> ApiResult<PredictionRequest> {
    match view.parse::<View>() {
        Ok(view) => Ok(Json(ApiResponse::success(PredictionRequest::defaults_for(view)))),
        Err(message) => Err((StatusCode::NOT_FOUND, Json(ApiResponse::error(message)))),
    }
}

// GET /models - Load status of each artifact
async fn model_status_handler(State(state): State<AppState>) -> Json<ApiResponse<Vec<ModelStatus>>> {
    Json(ApiResponse::success(state.engine.registry().statuses()))
}

// GET /league/sample - Context table shown beside the league form
async fn sample_league_handler() -> Json<ApiResponse<Vec<SampleRow>>> {
    Json(ApiResponse::success(sample_league_table()))
}

// POST /predict - Any view, selected by the "view" tag
async fn predict_handler(
    State(state): State<AppState>,
    body: Result<Json<PredictionRequest>, JsonRejection>,
) -> ApiResult<PredictionResponse> {
    let request = json_body(body)?;
    run_prediction(&state, request)
}

// POST /predict/goals
async fn predict_goals_handler(
    State(state): State<AppState>,
    body: Result<Json<PlayerStatRecord>, JsonRejection>,
) -> ApiResult<PredictionResponse> {
    let record = json_body(body)?;
    run_prediction(&state, PredictionRequest::TopGoalScorer(record))
}

// POST /predict/match
async fn predict_match_handler(
    State(state): State<AppState>,
    body: Result<Json<MatchStatRecord>, JsonRejection>,
) -> ApiResult<PredictionResponse> {
    let record = json_body(body)?;
    run_prediction(&state, PredictionRequest::MatchWinner(record))
}

// POST /predict/league
async fn predict_league_handler(
    State(state): State<AppState>,
    body: Result<Json<LeagueStatRecord>, JsonRejection>,
) -> ApiResult<PredictionResponse> {
    let record = json_body(body)?;
    run_prediction(&state, PredictionRequest::LeagueWinner(record))
}

/// Unwraps a JSON body, answering rejections inside the usual envelope.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::warn!("Rejected request body: {}", rejection.body_text());
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::error(rejection.body_text())),
            ))
        }
    }
}

fn run_prediction(state: &AppState, request: PredictionRequest) -> ApiResult<PredictionResponse> {
    let view = request.view();
    let outcome = state.engine.dispatch(&request).and_then(|prediction| {
        interpret(&request, &prediction, &state.logos).map(|rendered| (prediction, rendered))
    });
    match outcome {
        Ok((prediction, rendered)) => {
            tracing::info!("{} prediction: {}", view, rendered.message);
            Ok(Json(ApiResponse::success(PredictionResponse {
                request_id: Uuid::new_v4(),
                view,
                prediction,
                rendered,
            })))
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!("{} prediction failed: {}", view, e);
            } else {
                tracing::warn!("{} prediction rejected: {}", view, e);
            }
            Err((status, Json(ApiResponse::error(e.to_string()))))
        }
    }
}

fn status_for(error: &PredictError) -> StatusCode {
    match error {
        e if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        PredictError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
