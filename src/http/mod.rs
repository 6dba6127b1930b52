//! HTTP surface
//!
//! JSON over HTTP in front of a single shared [`Tracker`]:
//!
//! - `/tasks`, `/epics`, `/subtasks`: list, create-or-update, delete all
//! - `/{kind}/{id}`: fetch (records a view) or delete one record
//! - `/epics/{id}/subtasks`, `/history`, `/prioritized`: read-only views
//!
//! Store errors map to status codes in [`response::ApiError`].

pub mod handlers;
pub mod response;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::service::Tracker;

/// Tracker shared by all in-flight requests.
pub type SharedTracker = Arc<Mutex<Tracker>>;

pub fn shared(tracker: Tracker) -> SharedTracker {
    Arc::new(Mutex::new(tracker))
}

/// Build the router over `tracker`.
pub fn router(tracker: SharedTracker) -> Router {
    use handlers::*;

    Router::new()
        .route("/health", get(health))
        .route(
            "/tasks",
            get(list_tasks).post(upsert_task).delete(delete_all_tasks),
        )
        .route("/tasks/{id}", get(get_task).delete(delete_task))
        .route(
            "/epics",
            get(list_epics).post(upsert_epic).delete(delete_all_epics),
        )
        .route("/epics/{id}", get(get_epic).delete(delete_epic))
        .route("/epics/{id}/subtasks", get(get_epic_subtasks))
        .route(
            "/subtasks",
            get(list_subtasks)
                .post(upsert_subtask)
                .delete(delete_all_subtasks),
        )
        .route("/subtasks/{id}", get(get_subtask).delete(delete_subtask))
        .route("/history", get(history))
        .route("/prioritized", get(prioritized))
        .layer(TraceLayer::new_for_http())
        .with_state(tracker)
}

/// Bind `config.bind_addr()` and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, tracker: Tracker) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "task tracker listening");

    axum::serve(listener, router(shared(tracker)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("task tracker stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
