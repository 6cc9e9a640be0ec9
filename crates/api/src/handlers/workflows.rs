use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::AppState;
use engine::WorkflowDefinition;

pub async fn list(State(state): State<AppState>) -> Json<Vec<WorkflowDefinition>> {
    let workflows = state
        .controller
        .workflows()
        .iter()
        .map(|w| (**w).clone())
        .collect();
    Json(workflows)
}

pub async fn get(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WorkflowDefinition>, StatusCode> {
    match state.controller.workflow(&id) {
        Some(wf) => Ok(Json((*wf).clone())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(definition): Json<WorkflowDefinition>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let id = definition.id.clone();
    match state.controller.register(definition) {
        Ok(()) => Ok((StatusCode::CREATED, Json(json!({ "id": id })))),
        // Compilation failures (cycles, dangling edges, undeclared output
        // fields) are the caller's fault.
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )),
    }
}
