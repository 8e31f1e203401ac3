use crate::attributes::{self, FeatureSummary, ZoneAttributes};
use crate::config::AppConfig;
use crate::geometry;
use crate::processing::{ComposedCollection, Composer};
use crate::types::{Dimension, DrawnZone, FilterCatalog, FilterState};
use crate::zones::{self, ZoneView};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use geo::algorithm::contains::Contains;
use geo::bounding_rect::BoundingRect;
use geo::{Point, Polygon};
use geojson::Feature;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

// Wrapper for RTree indexing
pub struct ZoneIndex {
    index: usize,
    geometry: Polygon<f64>,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for ZoneIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Session-scoped snapshots, replaced wholesale on each update.
pub struct Session {
    pub filters: Arc<FilterState>,
    pub zones: Arc<Vec<DrawnZone>>,
}

pub struct AppState {
    pub composer: Composer,
    pub catalog: FilterCatalog,
    pub tree: RTree<ZoneIndex>,
    pub session: Mutex<Session>,
}

impl AppState {
    pub fn new(composer: Composer, catalog: FilterCatalog) -> Self {
        let tree = build_index(&composer);
        let session = Session {
            filters: Arc::new(FilterState::all_active(&catalog)),
            zones: Arc::new(Vec::new()),
        };
        Self {
            composer,
            catalog,
            tree,
            session: Mutex::new(session),
        }
    }

    async fn filters(&self) -> Arc<FilterState> {
        self.session.lock().await.filters.clone()
    }

    async fn replace_filters(&self, filters: FilterState) -> ComposedCollection {
        let filters = Arc::new(filters);
        self.session.lock().await.filters = filters.clone();
        self.composer.compose(&filters)
    }
}

/// Spatial index over the pre-filter survivors.
fn build_index(composer: &Composer) -> RTree<ZoneIndex> {
    let features = composer.features();
    let items: Vec<ZoneIndex> = composer
        .survivors()
        .iter()
        .filter_map(|&index| {
            let geometry = geometry::to_polygon(features[index].geometry.as_ref())?;
            let rect = geometry.bounding_rect()?;
            Some(ZoneIndex {
                index,
                geometry,
                aabb: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();

    info!("Building spatial index for {} zones...", items.len());
    RTree::bulk_load(items)
}

pub fn router(state: Arc<AppState>, static_dir: Option<&std::path::Path>) -> Router {
    let api = Router::new()
        .route("/api/options", get(options_handler))
        .route("/api/filters", get(get_filters_handler).put(put_filters_handler))
        .route("/api/filters/reset", post(reset_filters_handler))
        .route("/api/collection", get(collection_handler))
        .route("/api/zones", get(list_zones_handler).post(draw_zone_handler))
        .route("/api/query", get(query_handler));

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn start_server(
    config: AppConfig,
    composer: Composer,
    catalog: FilterCatalog,
) -> Result<()> {
    let state = Arc::new(AppState::new(composer, catalog));
    let app = router(state, config.server.static_dir.as_deref());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn options_handler(State(state): State<Arc<AppState>>) -> Json<FilterCatalog> {
    Json(state.catalog.clone())
}

async fn get_filters_handler(State(state): State<Arc<AppState>>) -> Json<FilterState> {
    Json(state.filters().await.as_ref().clone())
}

async fn put_filters_handler(
    State(state): State<Arc<AppState>>,
    Json(filters): Json<FilterState>,
) -> Json<ComposedCollection> {
    Json(state.replace_filters(filters).await)
}

async fn reset_filters_handler(State(state): State<Arc<AppState>>) -> Json<ComposedCollection> {
    let filters = FilterState::all_active(&state.catalog);
    Json(state.replace_filters(filters).await)
}

async fn collection_handler(State(state): State<Arc<AppState>>) -> Json<ComposedCollection> {
    let filters = state.filters().await;
    Json(state.composer.compose(&filters))
}

#[derive(Serialize)]
struct ZoneList<'a> {
    count: usize,
    zones: Vec<ZoneView<'a>>,
}

fn zone_list(zones: &[DrawnZone]) -> Response {
    Json(ZoneList {
        count: zones.len(),
        zones: zones.iter().map(ZoneView::from).collect(),
    })
    .into_response()
}

async fn list_zones_handler(State(state): State<Arc<AppState>>) -> Response {
    let zones = state.session.lock().await.zones.clone();
    zone_list(&zones)
}

async fn draw_zone_handler(
    State(state): State<Arc<AppState>>,
    Json(feature): Json<Feature>,
) -> Response {
    let feature = match zones::validate_drawn(feature) {
        Ok(feature) => feature,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let zones = {
        let mut session = state.session.lock().await;
        let next = Arc::new(zones::record_zone(&session.zones, feature, chrono::Local::now()));
        session.zones = next.clone();
        next
    };
    if let Some(zone) = zones.last() {
        info!("Recorded drawn zone {} ({} total)", zone.id, zones.len());
    }
    zone_list(&zones)
}

#[derive(Deserialize)]
pub struct QueryParams {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
pub struct QueryResponse {
    index: usize,
    governed_by: Option<Dimension>,
    summary: FeatureSummary,
}

/// Topmost visible zone under the point; later features render above earlier ones.
async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<QueryResponse>> {
    let filters = state.filters().await;
    let point = Point::new(params.lon, params.lat);
    let envelope = AABB::from_point([params.lon, params.lat]);

    let hit = state
        .tree
        .locate_in_envelope_intersecting(&envelope)
        .filter(|candidate| candidate.geometry.contains(&point))
        .map(|candidate| candidate.index)
        .filter(|&index| crate::filter::include(&state.composer.features()[index], &filters))
        .max();

    Json(hit.map(|index| {
        let feature = &state.composer.features()[index];
        let zone = ZoneAttributes::from_properties(feature.properties.as_ref());
        QueryResponse {
            index,
            governed_by: zone.governing_dimension(),
            summary: attributes::summary(feature.properties.as_ref()),
        }
    }))
}
