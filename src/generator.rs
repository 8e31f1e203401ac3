//! Synthetic cadastral plots around a centre point, laid out on a jittered grid.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;

const LAND_USES: [&str; 5] = ["Agricultural", "Residential", "Commercial", "Public", "Forest"];

#[derive(Debug, Clone, Copy)]
pub struct GeneratorParams {
    pub center_lat: f64,
    pub center_lng: f64,
    /// Half-width of the generated square, in degrees.
    pub radius: f64,
    pub count: usize,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            center_lat: 49.95,
            center_lng: 24.30,
            radius: 0.02,
            count: 250,
        }
    }
}

/// `4621355200:ZZ:PPP`, a hundred plots per zone.
pub fn cadastral_number(index: usize) -> String {
    let zone = index / 100 + 1;
    let plot = index % 100 + 1;
    format!("4621355200:{:02}:{:03}", zone, plot)
}

pub fn generate_zones(params: &GeneratorParams, seed: Option<u64>) -> FeatureCollection {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let density = (params.count as f64).sqrt();
    let side = density.ceil() as usize;
    let mut features = Vec::with_capacity(params.count);

    'grid: for i in 0..side {
        for j in 0..side {
            let index = i * side + j;
            if index >= params.count {
                break 'grid;
            }

            let lat_offset = (i as f64 / density - 0.5) * params.radius * 2.0
                + (rng.gen::<f64>() - 0.5) * 0.001;
            let lng_offset = (j as f64 / density - 0.5) * params.radius * 2.0
                + (rng.gen::<f64>() - 0.5) * 0.001;

            let ring = plot_ring(&mut rng, params, lat_offset, lng_offset);

            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), json!(format!("Plot {}", index + 1)));
            properties.insert("cadastral_number".to_string(), json!(cadastral_number(index)));
            properties.insert(
                "area_hectares".to_string(),
                json!(((rng.gen::<f64>() * 5.0 + 0.5) * 10.0).round() / 10.0),
            );
            properties.insert(
                "land_use".to_string(),
                json!(LAND_USES.choose(&mut rng).copied().unwrap_or("Agricultural")),
            );

            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Skewed rectangle, 0.0005–0.002° per side, closed.
fn plot_ring(
    rng: &mut StdRng,
    params: &GeneratorParams,
    lat_offset: f64,
    lng_offset: f64,
) -> Vec<Vec<f64>> {
    let size_lat = 0.0005 + rng.gen::<f64>() * 0.0015;
    let size_lng = 0.0005 + rng.gen::<f64>() * 0.0015;

    let lat1 = params.center_lat + lat_offset;
    let lng1 = params.center_lng + lng_offset;
    let lat2 = lat1 + size_lat;
    let lng2 = lng1 + size_lng;

    let skew = 0.0001 * (rng.gen::<f64>() - 0.5);

    vec![
        vec![lng1, lat1],
        vec![lng2, lat1 + skew],
        vec![lng2 + skew, lat2],
        vec![lng1, lat2],
        vec![lng1, lat1],
    ]
}
