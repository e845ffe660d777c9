//! Task page server

use anyhow::{Context, Result};
use arbius_core::TaskId;
use arbius_host::{
    render_html, Config, GraphQlVoteReader, JsonRpcClient, Links, TaskSession, TaskView,
    TemplateRegistry, Viewer,
};
use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{unix_now, SETTLE_TIMEOUT};

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    client: Arc<JsonRpcClient>,
    votes: Arc<GraphQlVoteReader>,
    links: Arc<Links>,
    templates: Arc<TemplateRegistry>,
}

impl AppState {
    fn new(config: Config) -> Result<Self> {
        Ok(Self {
            client: Arc::new(JsonRpcClient::new(config.rpc_url.clone())),
            votes: Arc::new(GraphQlVoteReader::new(config.subgraph_url.clone(), &config.vote_network)),
            links: Arc::new(Links::from_config(&config)),
            templates: Arc::new(TemplateRegistry::from_config(&config)?),
            config: Arc::new(config),
        })
    }

    /// Load a task and wait a bounded time for its reads
    async fn load(&self, taskid: &str) -> TaskView {
        let task = TaskId::from_route(Some(taskid));
        let mut session = TaskSession::new(
            Arc::clone(&self.client),
            Arc::clone(&self.votes),
            &self.config,
            Viewer::default(),
        );
        session.set_task(task);

        if task.is_some() && tokio::time::timeout(SETTLE_TIMEOUT, session.settled()).await.is_err() {
            warn!(taskid, "Rendering with reads still pending");
        }
        session.view(&self.links, &self.templates, unix_now())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/task/:taskid", get(task_page))
        .route("/api/task/:taskid", get(task_json))
        .with_state(state)
}

pub(crate) async fn serve(config: Config) -> Result<()> {
    let listen_addr = config.listen_addr.clone();
    let app = router(AppState::new(config)?);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    info!("Explorer listening on {}", listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn task_page(State(state): State<AppState>, Path(taskid): Path<String>) -> Html<String> {
    Html(render_html(&state.load(&taskid).await))
}

async fn task_json(State(state): State<AppState>, Path(taskid): Path<String>) -> Json<TaskView> {
    Json(state.load(&taskid).await)
}
