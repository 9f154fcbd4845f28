mod handlers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::config::EstimatorConfig;
use crate::db::Database;
use crate::workspace::Workspace;

/// Open workspaces unused for this long are dropped on the next access.
pub const WORKSPACE_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Shared server state. Open workspaces are kept in memory so undo/redo
/// survives between requests; every edit is also written back to the store.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<EstimatorConfig>,
    workspaces: Arc<Mutex<HashMap<Uuid, OpenWorkspace>>>,
}

struct OpenWorkspace {
    workspace: Workspace,
    last_used: Instant,
}

impl AppState {
    pub fn new(db: Database, config: EstimatorConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            workspaces: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of workspaces currently held in memory.
    pub fn open_workspaces(&self) -> usize {
        self.workspaces.lock().expect("workspace lock poisoned").len()
    }

    /// Drop workspaces unused for at least `max_idle`. Their documents are
    /// already stored, only their undo history goes. Returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut workspaces = self.workspaces.lock().expect("workspace lock poisoned");
        evict_idle(&mut workspaces, max_idle)
    }
}

fn evict_idle(workspaces: &mut HashMap<Uuid, OpenWorkspace>, max_idle: Duration) -> usize {
    let before = workspaces.len();
    workspaces.retain(|_, open| open.last_used.elapsed() < max_idle);
    let evicted = before - workspaces.len();
    if evicted > 0 {
        tracing::debug!(evicted, "evicted idle workspaces");
    }
    evicted
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Projects
        .route("/projects", get(handlers::list_projects).post(handlers::create_project))
        .route("/projects/import", post(handlers::import_project))
        .route(
            "/projects/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route("/projects/{id}/estimate", get(handlers::get_estimate))
        .route("/projects/{id}/tree", get(handlers::render_project_tree))
        .route("/projects/{id}/config", put(handlers::update_config))
        // Tree edits
        .route("/projects/{id}/nodes", post(handlers::insert_node))
        .route(
            "/projects/{id}/nodes/{node_id}",
            put(handlers::update_node).delete(handlers::delete_node),
        )
        .route("/projects/{id}/nodes/{node_id}/move", post(handlers::move_node))
        .route("/projects/{id}/nodes/{node_id}/buttons", post(handlers::add_buttons))
        .route(
            "/projects/{id}/nodes/{node_id}/buttons/{button_id}",
            put(handlers::update_button).delete(handlers::remove_button),
        )
        // History
        .route("/projects/{id}/undo", post(handlers::undo))
        .route("/projects/{id}/redo", post(handlers::redo))
        // Stateless
        .route("/estimate", post(handlers::estimate))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
