use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::AppState;
use engine::{ControllerError, RunInstance};

#[derive(serde::Deserialize, Default)]
pub struct StartRunDto {
    #[serde(default)]
    pub params: Value,
}

pub async fn start(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Option<Json<StartRunDto>>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    match state.controller.start(&id, payload.params) {
        Ok(run_id) => Ok((StatusCode::ACCEPTED, Json(json!({ "run_id": run_id })))),
        Err(e @ ControllerError::UnknownWorkflow(_)) => Err(error_body(StatusCode::NOT_FOUND, e)),
        Err(e @ ControllerError::RunAlreadyActive(_)) => Err(error_body(StatusCode::CONFLICT, e)),
        Err(e) => Err(error_body(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}

pub async fn status(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<RunInstance>, StatusCode> {
    match state.controller.status(id) {
        Ok(run) => Ok(Json(run)),
        Err(ControllerError::RunNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub async fn cancel(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, StatusCode> {
    match state.controller.cancel(id) {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(ControllerError::RunNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

fn error_body(code: StatusCode, e: ControllerError) -> (StatusCode, Json<Value>) {
    (code, Json(json!({ "error": e.to_string() })))
}
