use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{HeaderValue, header};
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceExt;
use tower::service_fn;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::graph::RosterGraph;
use crate::interaction::InteractionMode;
use crate::render::render_svg;
use crate::roster::{
    DEFAULT_SELECTED_TEAMS, RosterDocument, RosterError, build_entities, data_url, fetch_roster,
    read_roster,
};
use crate::utils::parse_team_list;
use crate::{Point, Viewport};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Arguments for running the rosterviz web server
#[derive(Debug, Clone, Parser)]
#[command(name = "rosterviz serve", about = "Start the rosterviz web sync API server.")]
pub struct ServeArgs {
    /// Roster document to serve: a local JSON file or an HTTP(S) URL.
    /// Defaults to the public mirror for --league/--season.
    #[arg(short = 'i', long = "input")]
    pub input: Option<String>,

    /// League segment of the default data URL.
    #[arg(long, default_value = crate::roster::DEFAULT_LEAGUE)]
    pub league: String,

    /// Season segment of the default data URL.
    #[arg(long, default_value = crate::roster::DEFAULT_SEASON)]
    pub season: String,

    /// Comma-separated team abbreviations to display initially.
    #[arg(short = 't', long = "teams")]
    pub teams: Option<String>,

    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 5151)]
    pub port: u16,

    /// Initial simulation viewport width.
    #[arg(long, default_value_t = 800.0)]
    pub width: f32,

    /// Initial simulation viewport height.
    #[arg(long, default_value_t = 500.0)]
    pub height: f32,

    /// Pointer interaction mode for the graph surface.
    #[arg(long, value_enum, default_value_t = InteractionMode::Drag)]
    pub interaction: InteractionMode,

    /// Background color for rendered SVG previews.
    #[arg(long = "background-color", default_value = "white")]
    pub background_color: String,

    /// Serve a static web UI from this directory.
    #[arg(long = "ui-dir")]
    pub ui_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
enum RosterSource {
    Url(String),
    File(PathBuf),
}

impl RosterSource {
    fn describe(&self) -> String {
        match self {
            RosterSource::Url(url) => url.clone(),
            RosterSource::File(path) => path.display().to_string(),
        }
    }
}

struct ServeState {
    source: RosterSource,
    background: String,
    graph: RwLock<RosterGraph>,
    document: RwLock<Option<RosterDocument>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphPayload {
    viewport: Viewport,
    mode: String,
    alpha: f32,
    settled: bool,
    transform: TransformPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_error: Option<String>,
    anchors: Vec<AnchorPayload>,
    nodes: Vec<NodePayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransformPayload {
    scale: f32,
    translate: Point,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnchorPayload {
    group: String,
    display_name: String,
    color: String,
    position: Point,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NodePayload {
    id: String,
    label: String,
    group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    jersey: Option<u32>,
    position: Point,
    pinned: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TeamOptionPayload {
    value: String,
    label: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DragPhase {
    Start,
    Move,
    End,
}

#[derive(Debug, Deserialize)]
struct DragRequest {
    phase: DragPhase,
    id: String,
    #[serde(default)]
    x: Option<f32>,
    #[serde(default)]
    y: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct PanRequest {
    dx: f32,
    dy: f32,
}

#[derive(Debug, Deserialize)]
struct ZoomRequest {
    factor: f32,
    #[serde(default)]
    focal: Option<Point>,
}

#[derive(Debug, Deserialize)]
struct ResizeRequest {
    width: f32,
    height: f32,
}

#[derive(Debug, Deserialize)]
struct TeamsRequest {
    selected: Vec<String>,
}

async fn load_document(source: &RosterSource) -> Result<RosterDocument, RosterError> {
    match source {
        RosterSource::Url(url) => fetch_roster(url).await,
        RosterSource::File(path) => read_roster(path),
    }
}

impl ServeState {
    /// Re-fetch the document and rebuild the graph for `selected`. The old
    /// graph is replaced atomically; a failed fetch leaves the "data
    /// unavailable" state in place instead of tearing the server down.
    async fn rebuild(&self, selected: &[String]) -> Result<(), RosterError> {
        let (viewport, mode) = {
            let graph = self.graph.read().await;
            (graph.viewport(), graph.mode())
        };

        match load_document(&self.source).await {
            Ok(document) => {
                let built = build_entities(&document, selected);
                if built.skipped > 0 {
                    eprintln!("warning: skipped {} athletes without ids", built.skipped);
                }
                *self.document.write().await = Some(document);
                *self.graph.write().await =
                    RosterGraph::new(built.entities, built.groups, built.palette, viewport, mode);
                Ok(())
            }
            Err(error) => {
                *self.graph.write().await =
                    RosterGraph::unavailable(viewport, mode, error.to_string());
                Err(error)
            }
        }
    }
}

pub async fn run_serve(args: ServeArgs, ui_root: Option<PathBuf>) -> Result<()> {
    let source = match &args.input {
        Some(input) if input.starts_with("http://") || input.starts_with("https://") => {
            RosterSource::Url(input.clone())
        }
        Some(input) => RosterSource::File(PathBuf::from(input)),
        None => RosterSource::Url(data_url(&args.league, &args.season)),
    };

    let selected: Vec<String> = match &args.teams {
        Some(teams) => parse_team_list(teams),
        None => DEFAULT_SELECTED_TEAMS
            .iter()
            .map(|abbr| abbr.to_string())
            .collect(),
    };

    let viewport = Viewport::new(args.width, args.height);
    let state = Arc::new(ServeState {
        source,
        background: args.background_color.clone(),
        graph: RwLock::new(RosterGraph::empty(viewport, args.interaction)),
        document: RwLock::new(None),
    });

    if let Err(error) = state.rebuild(&selected).await {
        eprintln!(
            "warning: initial roster load from {} failed: {error}",
            state.source.describe()
        );
    }

    // One animation loop for the whole server; every mutation and every
    // step goes through the graph lock, so handlers never interleave with
    // a step mid-flight.
    let ticker_state = state.clone();
    let ticker = tokio::spawn(async move {
        let mut frames = tokio::time::interval(FRAME_INTERVAL);
        loop {
            frames.tick().await;
            ticker_state.graph.write().await.step_once();
        }
    });

    let mut app = Router::new()
        .route("/api/graph", get(get_graph))
        .route("/api/graph/svg", get(get_svg))
        .route("/api/graph/drag", put(put_drag))
        .route("/api/graph/pan", put(put_pan))
        .route("/api/graph/zoom", put(put_zoom))
        .route("/api/graph/resize", put(put_resize))
        .route("/api/graph/teams", put(put_teams))
        .route("/api/teams", get(get_teams))
        .with_state(state);

    if let Some(root) = ui_root {
        let static_dir = ServeDir::new(root.clone())
            .append_index_html_on_directories(true)
            .fallback(ServeFile::new(root.join("index.html")));
        let dir_for_service = static_dir.clone();

        let static_service = service_fn(move |req| {
            let svc = dir_for_service.clone();
            async move {
                match svc.oneshot(req).await {
                    Ok(response) => Ok(response.map(axum::body::Body::new)),
                    Err(error) => {
                        let message = format!("Static file error: {error}");
                        Ok((StatusCode::INTERNAL_SERVER_ERROR, message).into_response())
                    }
                }
            }
        });

        app = app.fallback_service(static_service);
    }

    let app = app.layer(CorsLayer::permissive());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind HTTP server to {addr}"))?;

    println!("rosterviz server listening on http://{addr}");
    println!("Press Ctrl+C to stop.");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server error");

    // Halt the animation loop before returning so no further steps run.
    ticker.abort();
    result
}

async fn get_graph(State(state): State<Arc<ServeState>>) -> Json<GraphPayload> {
    let graph = state.graph.read().await;
    let transform = graph.transform();

    let mut anchors = Vec::new();
    for group in graph.groups() {
        let Some(position) = graph.anchors().effective(group) else {
            continue;
        };
        let colors = graph.palette().colors_for(group);
        anchors.push(AnchorPayload {
            group: group.clone(),
            display_name: colors.display_name,
            color: colors.primary,
            position,
        });
    }

    let nodes = graph
        .entities()
        .iter()
        .map(|entity| NodePayload {
            id: entity.id.clone(),
            label: entity.label.clone(),
            group: entity.group.clone(),
            jersey: entity.jersey,
            position: entity.position(),
            pinned: entity.is_pinned(),
        })
        .collect();

    Json(GraphPayload {
        viewport: graph.viewport(),
        mode: graph.mode().as_str().to_string(),
        alpha: graph.alpha(),
        settled: graph.is_settled(),
        transform: TransformPayload {
            scale: transform.scale,
            translate: transform.translate,
        },
        data_error: graph.data_error().map(str::to_string),
        anchors,
        nodes,
    })
}

async fn get_svg(State(state): State<Arc<ServeState>>) -> Result<Response, (StatusCode, String)> {
    let graph = state.graph.read().await;
    let svg = render_svg(&graph, &state.background).map_err(internal_error)?;

    let mut response = Response::new(svg.into());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("image/svg+xml"),
    );
    Ok(response)
}

async fn get_teams(
    State(state): State<Arc<ServeState>>,
) -> Result<Json<Vec<TeamOptionPayload>>, (StatusCode, String)> {
    let document = state.document.read().await;
    let Some(document) = document.as_ref() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "roster data unavailable".to_string(),
        ));
    };

    let mut options: Vec<TeamOptionPayload> = document
        .teams
        .values()
        .map(|team| TeamOptionPayload {
            value: team.team_info.abbreviation.clone(),
            label: team.team_info.display_name.clone(),
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));

    Ok(Json(options))
}

async fn put_drag(
    State(state): State<Arc<ServeState>>,
    Json(request): Json<DragRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut graph = state.graph.write().await;
    if graph.mode() != InteractionMode::Drag {
        return Err((
            StatusCode::CONFLICT,
            "graph is running in pan mode".to_string(),
        ));
    }

    let accepted = match request.phase {
        DragPhase::Start => graph.drag_start(&request.id),
        DragPhase::Move => {
            let (Some(x), Some(y)) = (request.x, request.y) else {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "drag move requires x and y".to_string(),
                ));
            };
            graph.drag_move(&request.id, x, y)
        }
        DragPhase::End => graph.drag_end(&request.id),
    };

    if accepted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            format!("no draggable entity '{}'", request.id),
        ))
    }
}

async fn put_pan(
    State(state): State<Arc<ServeState>>,
    Json(request): Json<PanRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut graph = state.graph.write().await;
    if graph.pan(request.dx, request.dy) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::CONFLICT,
            "graph is running in drag mode".to_string(),
        ))
    }
}

async fn put_zoom(
    State(state): State<Arc<ServeState>>,
    Json(request): Json<ZoomRequest>,
) -> StatusCode {
    let mut graph = state.graph.write().await;
    let focal = request.focal.unwrap_or_else(|| graph.viewport().center());
    graph.zoom(request.factor, focal);
    StatusCode::NO_CONTENT
}

async fn put_resize(
    State(state): State<Arc<ServeState>>,
    Json(request): Json<ResizeRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !(request.width > 0.0 && request.height > 0.0) {
        return Err((
            StatusCode::BAD_REQUEST,
            "viewport dimensions must be positive".to_string(),
        ));
    }
    let mut graph = state.graph.write().await;
    graph.resize(request.width, request.height);
    Ok(StatusCode::NO_CONTENT)
}

async fn put_teams(
    State(state): State<Arc<ServeState>>,
    Json(request): Json<TeamsRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    match state.rebuild(&request.selected).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(error) => Err((StatusCode::BAD_GATEWAY, error.to_string())),
    }
}

fn internal_error(err: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
