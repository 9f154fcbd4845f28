use std::collections::hash_map::Entry;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AppState, OpenWorkspace, WORKSPACE_IDLE_TIMEOUT};
use crate::estimate::{self, EstimateResult};
use crate::import::{self, SkippedEntry};
use crate::models::*;
use crate::render;
use crate::tree::TreeError;
use crate::workspace::{ConfigUpdate, Workspace};

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Tree edits are rejected with the error text, which is safe to expose.
fn tree_error(e: TreeError) -> (StatusCode, String) {
    let status = match &e {
        TreeError::NodeNotFound(_) | TreeError::ButtonNotFound(_) => StatusCode::NOT_FOUND,
        TreeError::Cycle { .. }
        | TreeError::NotAMenu(_)
        | TreeError::HasButtons(_)
        | TreeError::DuplicateButtonName { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TreeError::DuplicateId(_) => StatusCode::CONFLICT,
    };
    tracing::warn!("Rejected tree edit: {}", e);
    (status, e.to_string())
}

fn project_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Project not found".to_string())
}

// ============================================================
// Responses
// ============================================================

/// State of an open project after an edit, with its fresh estimate.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkspaceView {
    pub project_id: Uuid,
    /// Ids created or removed by the edit, if any.
    #[serde(default)]
    pub affected: Vec<Uuid>,
    pub document: EstimateProject,
    pub estimate: EstimateResult,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl WorkspaceView {
    fn of(project_id: Uuid, workspace: &Workspace, affected: Vec<Uuid>) -> Self {
        Self {
            project_id,
            affected,
            document: workspace.project().clone(),
            estimate: workspace.recompute(),
            can_undo: workspace.history().can_undo(),
            can_redo: workspace.history().can_redo(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub project: Project,
    pub skipped: Vec<SkippedEntry>,
}

// ============================================================
// Request bodies
// ============================================================

#[derive(Debug, Deserialize)]
pub struct InsertNodeInput {
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub node: FeatureNode,
}

#[derive(Debug, Deserialize)]
pub struct MoveNodeInput {
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddButtonsInput {
    #[serde(default)]
    pub buttons: Vec<ButtonTemplate>,
    /// Also add the six standard operations.
    #[serde(default)]
    pub standard: bool,
    #[serde(default)]
    pub complexity: Option<Tier>,
}

#[derive(Debug, Deserialize)]
pub struct ImportProjectInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub document: serde_json::Value,
}

// ============================================================
// Workspace access
// ============================================================

/// Run `op` against the project's open workspace (opening it from the store
/// if needed), persist the document, and return the recomputed view.
fn edit_workspace(
    state: &AppState,
    project_id: Uuid,
    op: impl FnOnce(&mut Workspace) -> ApiResult<Vec<Uuid>>,
) -> ApiResult<Json<WorkspaceView>> {
    with_workspace(state, project_id, true, op)
}

/// The project's current view. Nothing is written back.
fn view_workspace(state: &AppState, project_id: Uuid) -> ApiResult<Json<WorkspaceView>> {
    with_workspace(state, project_id, false, |_| Ok(Vec::new()))
}

fn with_workspace(
    state: &AppState,
    project_id: Uuid,
    persist: bool,
    op: impl FnOnce(&mut Workspace) -> ApiResult<Vec<Uuid>>,
) -> ApiResult<Json<WorkspaceView>> {
    let mut workspaces = state.workspaces.lock().expect("workspace lock poisoned");
    super::evict_idle(&mut workspaces, WORKSPACE_IDLE_TIMEOUT);

    let open = match workspaces.entry(project_id) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            let project = state
                .db
                .get_project(project_id)
                .map_err(internal_error)?
                .ok_or_else(project_not_found)?;
            entry.insert(OpenWorkspace {
                workspace: Workspace::from_config(project.document, &state.config),
                last_used: Instant::now(),
            })
        }
    };
    open.last_used = Instant::now();
    let workspace = &mut open.workspace;

    let affected = op(workspace)?;
    let view = WorkspaceView::of(project_id, workspace, affected);

    if persist
        && !state
            .db
            .save_document(project_id, workspace.project())
            .map_err(internal_error)?
    {
        workspaces.remove(&project_id);
        return Err(project_not_found());
    }

    Ok(Json(view))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<ProjectSummary>>> {
    state.db.get_all_projects().map(Json).map_err(internal_error)
}

pub async fn get_project(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Project>> {
    state
        .db
        .get_project(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(project_not_found)
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    state
        .db
        .create_project(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProjectInput>,
) -> ApiResult<Json<Project>> {
    state
        .db
        .update_project(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(project_not_found)
}

pub async fn delete_project(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state
        .workspaces
        .lock()
        .expect("workspace lock poisoned")
        .remove(&id);

    if state.db.delete_project(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(project_not_found())
    }
}

/// Create a project from a persisted document, skipping unreadable entries.
pub async fn import_project(
    State(state): State<AppState>,
    Json(input): Json<ImportProjectInput>,
) -> ApiResult<(StatusCode, Json<ImportResponse>)> {
    let imported = import::import_value(input.document).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let project = state
        .db
        .create_project(CreateProjectInput {
            name: input.name,
            description: input.description,
            document: Some(imported.project),
        })
        .map_err(internal_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            project,
            skipped: imported.skipped,
        }),
    ))
}

// ============================================================
// Estimates
// ============================================================

pub async fn get_estimate(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<WorkspaceView>> {
    view_workspace(&state, id)
}

/// Compute an estimate for a document without storing anything.
pub async fn estimate(
    State(state): State<AppState>,
    Json(document): Json<EstimateProject>,
) -> Json<EstimateResult> {
    Json(estimate::compute(&document, &state.config.calibration))
}

pub async fn render_project_tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .db
        .get_project(id)
        .map_err(internal_error)?
        .ok_or_else(project_not_found)?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render::render_tree(&project.document.tree),
    ))
}

pub async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ConfigUpdate>,
) -> ApiResult<Json<WorkspaceView>> {
    edit_workspace(&state, id, |ws| {
        ws.apply_config(update);
        Ok(Vec::new())
    })
}

// ============================================================
// Tree edits
// ============================================================

pub async fn insert_node(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<InsertNodeInput>,
) -> ApiResult<(StatusCode, Json<WorkspaceView>)> {
    let view = edit_workspace(&state, id, |ws| {
        ws.insert_node(input.parent_id, input.node)
            .map(|node_id| vec![node_id])
            .map_err(tree_error)
    })?;
    Ok((StatusCode::CREATED, view))
}

pub async fn update_node(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(Uuid, Uuid)>,
    Json(field): Json<NodeField>,
) -> ApiResult<Json<WorkspaceView>> {
    edit_workspace(&state, id, |ws| {
        ws.update_field(node_id, field).map_err(tree_error)?;
        Ok(Vec::new())
    })
}

pub async fn delete_node(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<WorkspaceView>> {
    edit_workspace(&state, id, |ws| ws.delete_node(node_id).map_err(tree_error))
}

pub async fn move_node(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<MoveNodeInput>,
) -> ApiResult<Json<WorkspaceView>> {
    edit_workspace(&state, id, |ws| {
        ws.move_node(node_id, input.parent_id, input.index)
            .map_err(tree_error)?;
        Ok(Vec::new())
    })
}

pub async fn add_buttons(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<AddButtonsInput>,
) -> ApiResult<Json<WorkspaceView>> {
    let mut templates = if input.standard {
        ButtonTemplate::standard(input.complexity)
    } else {
        Vec::new()
    };
    templates.extend(input.buttons);

    edit_workspace(&state, id, |ws| {
        ws.add_buttons(node_id, &templates).map_err(tree_error)?;
        Ok(Vec::new())
    })
}

pub async fn update_button(
    State(state): State<AppState>,
    Path((id, node_id, button_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(field): Json<NodeField>,
) -> ApiResult<Json<WorkspaceView>> {
    edit_workspace(&state, id, |ws| {
        ws.update_button(node_id, button_id, field)
            .map_err(tree_error)?;
        Ok(Vec::new())
    })
}

pub async fn remove_button(
    State(state): State<AppState>,
    Path((id, node_id, button_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<WorkspaceView>> {
    edit_workspace(&state, id, |ws| {
        ws.remove_button(node_id, button_id)
            .map(|removed| vec![removed.id])
            .map_err(tree_error)
    })
}

// ============================================================
// History
// ============================================================

/// Step back one tree version. A no-op at the oldest version.
pub async fn undo(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<WorkspaceView>> {
    edit_workspace(&state, id, |ws| {
        ws.undo();
        Ok(Vec::new())
    })
}

/// Step forward one tree version. A no-op at the newest version.
pub async fn redo(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<WorkspaceView>> {
    edit_workspace(&state, id, |ws| {
        ws.redo();
        Ok(Vec::new())
    })
}
