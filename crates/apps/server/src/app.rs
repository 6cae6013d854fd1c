use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use formats::{BoundaryDocument, RowError};
use layers::{MapModel, MapRecord, MapSelection, MetadataPanel, PointStyle, Selection, ViewKind};
use render::{SvgRenderer, ViewportConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<MapModel>,
    pub boundaries: Arc<BTreeMap<String, BoundaryDocument>>,
    pub viewport: ViewportConfig,
}

impl AppState {
    pub fn new(model: MapModel, boundaries: Vec<BoundaryDocument>, viewport: ViewportConfig) -> Self {
        let boundaries = boundaries
            .into_iter()
            .map(|doc| (doc.name.clone(), doc))
            .collect();
        Self {
            model: Arc::new(model),
            boundaries: Arc::new(boundaries),
            viewport,
        }
    }
}

pub fn router(state: AppState, static_root: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/controls", get(get_controls))
        .route("/api/scouts", get(get_scouts))
        .route("/api/map", get(get_map))
        .route("/api/map.svg", get(get_map_svg))
        .route("/api/cities/:city", get(get_city))
        .route("/api/boundaries", get(list_boundaries))
        .route("/api/boundaries/:name", get(get_boundary))
        .route("/api/problems", get(get_problems));

    if let Some(root) = static_root {
        app = app.fallback_service(ServeDir::new(root));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Raw `?scout=&year=` parameters; the year is validated by hand so a bad
/// value gets a JSON error body.
#[derive(Debug, Default, Deserialize)]
pub struct MapQuery {
    scout: Option<String>,
    year: Option<String>,
}

impl MapQuery {
    /// Serde failures on the query string are reported as JSON like the rest.
    fn parse(query: Result<Query<Self>, QueryRejection>) -> Result<Selection, Response> {
        match query {
            Ok(Query(query)) => query.selection(),
            Err(rejection) => Err(error_response(StatusCode::BAD_REQUEST, rejection.body_text())),
        }
    }

    fn selection(&self) -> Result<Selection, Response> {
        let year = match self.year.as_deref().map(str::trim) {
            None | Some("") | Some("All") => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(year) => Some(year),
                Err(_) => {
                    return Err(error_response(
                        StatusCode::BAD_REQUEST,
                        format!("year must be an integer, got {raw:?}"),
                    ))
                }
            },
        };
        Ok(Selection::new(self.scout.as_deref(), year))
    }
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn get_controls(State(state): State<AppState>) -> Response {
    Json(state.model.controls()).into_response()
}

async fn get_scouts(State(state): State<AppState>) -> Response {
    let aggregates = state.model.aggregates();
    Json(json!({
        "options": aggregates.scout_options,
        "scouts": aggregates.scouts.values().collect::<Vec<_>>(),
    }))
    .into_response()
}

#[derive(Debug, Serialize)]
struct MapPoint<'a> {
    #[serde(flatten)]
    record: &'a MapRecord,
    radius: f64,
    style: PointStyle,
    tooltip: String,
}

#[derive(Debug, Serialize)]
struct MapResponse<'a> {
    selection: &'a Selection,
    view: ViewKind,
    message: Option<&'a str>,
    total_recordings: u64,
    points: Vec<MapPoint<'a>>,
}

impl<'a> MapResponse<'a> {
    fn new(model: &MapModel, selection: &'a MapSelection) -> Self {
        let points = selection
            .records
            .iter()
            .map(|record| MapPoint {
                record,
                radius: model.radius(record),
                style: model.style(record),
                tooltip: layers::tooltip(record),
            })
            .collect();
        Self {
            selection: &selection.selection,
            view: selection.view,
            message: selection.message.as_deref(),
            total_recordings: selection.total_recordings(),
            points,
        }
    }
}

async fn get_map(
    State(state): State<AppState>,
    query: Result<Query<MapQuery>, QueryRejection>,
) -> Response {
    let selection = match MapQuery::parse(query) {
        Ok(selection) => selection,
        Err(resp) => return resp,
    };
    let result = state.model.select(&selection);
    debug!(
        "map query scout={} year={:?}: {} points",
        selection.scout_label(),
        selection.year,
        result.records.len()
    );
    Json(MapResponse::new(&state.model, &result)).into_response()
}

async fn get_map_svg(
    State(state): State<AppState>,
    query: Result<Query<MapQuery>, QueryRejection>,
) -> Response {
    let selection = match MapQuery::parse(query) {
        Ok(selection) => selection,
        Err(resp) => return resp,
    };
    let result = state.model.select(&selection);
    let mut svg = SvgRenderer::for_model(state.viewport, &state.model, state.boundaries.values());
    let body = svg.render_selection(&state.model, &result);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"))],
        body,
    )
        .into_response()
}

#[derive(Debug, Serialize)]
struct CityResponse {
    record: MapRecord,
    panel: MetadataPanel,
}

async fn get_city(
    State(state): State<AppState>,
    AxumPath(city): AxumPath<String>,
    query: Result<Query<MapQuery>, QueryRejection>,
) -> Response {
    let selection = match MapQuery::parse(query) {
        Ok(selection) => selection,
        Err(resp) => return resp,
    };
    let Some(record) = state.model.city(&city) else {
        return error_response(StatusCode::NOT_FOUND, format!("unknown city {city:?}"));
    };
    let panel = state.model.metadata(&record, &selection);
    Json(CityResponse { record, panel }).into_response()
}

async fn list_boundaries(State(state): State<AppState>) -> Response {
    let summaries: Vec<_> = state
        .boundaries
        .values()
        .map(|doc| {
            json!({
                "name": doc.name,
                "features": doc.features.len(),
                "bounds": doc.bounds(),
            })
        })
        .collect();
    Json(json!({ "boundaries": summaries })).into_response()
}

async fn get_boundary(State(state): State<AppState>, AxumPath(name): AxumPath<String>) -> Response {
    match state.boundaries.get(&name) {
        Some(doc) => Json(doc.raw()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("unknown boundary {name:?}")),
    }
}

#[derive(Debug, Serialize)]
struct Problems<'a> {
    rejected_rows: &'a [RowError],
    skipped_recordings: Vec<u32>,
}

async fn get_problems(State(state): State<AppState>) -> Response {
    let problems = Problems {
        rejected_rows: state.model.rejected(),
        skipped_recordings: state
            .model
            .aggregates()
            .skipped
            .iter()
            .map(|id| id.index())
            .collect(),
    };
    Json(problems).into_response()
}

#[cfg(test)]
mod tests {
    use super::{router, AppState};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use formats::{parse_recordings, BoundaryDocument};
    use layers::{MapConfig, MapModel};
    use render::ViewportConfig;
    use serde_json::Value;
    use tower::ServiceExt;

    const CSV: &str = "\
start_date,end_date,year,country,city,lat,lon,scouts,recordings
1905-03-01,1905-04-01,,Peru,Lima,-12.05,-77.04,A;B,3
1907-01-01,1908-01-01,,Peru,Lima,-12.05,-77.04,B,5
,,1902,Chile,Santiago,-33.45,-70.66,C,0
1903-01-01,,,Chile,Valparaiso,north,-71.6,C,2
";

    fn app() -> Router {
        let model = MapModel::from_report(parse_recordings(CSV.as_bytes()).unwrap(), MapConfig::default());
        let boundary = BoundaryDocument::from_geojson_str(
            "americas",
            r#"{"type":"FeatureCollection","features":[]}"#,
        )
        .unwrap();
        router(
            AppState::new(model, vec![boundary], ViewportConfig::default()),
            None,
        )
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = get(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let (status, body) = get(app(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn controls_list_scouts_and_years() {
        let (status, json) = get_json(app(), "/api/controls").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["scout_options"], serde_json::json!(["All", "A", "B", "C"]));
        assert_eq!(json["default_scout"], "All");
        assert_eq!(json["year_bounds"]["start"], 1902);
        assert_eq!(json["year_bounds"]["end"], 1908);
    }

    #[tokio::test]
    async fn map_dispatches_on_scout_and_year() {
        let (_, all) = get_json(app(), "/api/map").await;
        assert_eq!(all["view"], "cities");
        assert_eq!(all["points"].as_array().unwrap().len(), 2);
        assert_eq!(all["total_recordings"], 8);

        let (_, b) = get_json(app(), "/api/map?scout=B").await;
        assert_eq!(b["view"], "recordings");
        assert_eq!(b["points"].as_array().unwrap().len(), 2);
        assert_eq!(b["points"][0]["city"], "Lima");
        assert_eq!(b["points"][0]["tooltip"], "Lima, Peru");

        let (_, y) = get_json(app(), "/api/map?scout=All&year=1902").await;
        assert_eq!(y["points"][0]["city"], "Santiago");
        assert_eq!(y["points"][0]["style"]["class"], "point point--empty");

        let (_, none) = get_json(app(), "/api/map?year=1850").await;
        assert_eq!(none["points"].as_array().unwrap().len(), 0);
        assert_eq!(none["message"], "No recordings for 1850");
    }

    #[tokio::test]
    async fn bad_year_is_a_json_400() {
        let (status, json) = get_json(app(), "/api/map?year=soon").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("soon"));
    }

    #[tokio::test]
    async fn undecodable_query_is_a_json_400() {
        for uri in [
            "/api/map?scout=A&scout=B",
            "/api/map.svg?scout=A&scout=B",
            "/api/cities/Lima?year=1905&year=1906",
        ] {
            let (status, json) = get_json(app(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(json["error"].as_str().unwrap().contains("duplicate field"), "{uri}");
        }
    }

    #[tokio::test]
    async fn svg_endpoint_renders_points() {
        let (status, body) = get(app(), "/api/map.svg?scout=A").await;
        assert_eq!(status, StatusCode::OK);
        let svg = String::from_utf8(body).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"data-city="Lima""#));
    }

    #[tokio::test]
    async fn city_details_and_unknown_city() {
        let (status, json) = get_json(app(), "/api/cities/Lima").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["record"]["recording_count"], 8);
        assert_eq!(json["panel"]["title"], "Lima, Peru");

        let (_, santiago) = get_json(app(), "/api/cities/Santiago").await;
        assert_eq!(santiago["panel"]["recordings"], "Unknown");

        let (status, json) = get_json(app(), "/api/cities/Atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn boundaries_are_served_raw() {
        let (_, list) = get_json(app(), "/api/boundaries").await;
        assert_eq!(list["boundaries"][0]["name"], "americas");
        assert_eq!(list["boundaries"][0]["features"], 0);
        assert!(list["boundaries"][0]["bounds"].is_null());

        let (status, doc) = get_json(app(), "/api/boundaries/americas").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["type"], "FeatureCollection");

        let (status, _) = get_json(app(), "/api/boundaries/europe").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn problems_list_rejected_rows() {
        let (_, json) = get_json(app(), "/api/problems").await;
        let rows = json["rejected_rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["line"], 5);
        assert_eq!(rows[0]["kind"], "malformed_row");
        assert_eq!(rows[0]["field"], "lat");
    }

    #[tokio::test]
    async fn static_files_fall_back_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>map</h1>").unwrap();
        let model = MapModel::from_report(parse_recordings(CSV.as_bytes()).unwrap(), MapConfig::default());
        let app = router(
            AppState::new(model, Vec::new(), ViewportConfig::default()),
            Some(dir.path()),
        );
        let (status, body) = get(app, "/index.html").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>map</h1>");
    }
}
