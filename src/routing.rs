use std::time::Duration;

use geo::Polygon;
use geojson::GeoJson;
use serde::Deserialize;

use crate::error::{ReachError, Result};
use crate::overpass::Place;
use crate::utils;

/// Travel modes supported by the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Drive,
    Walk,
    Bike,
}

impl TravelMode {
    /// The routing-service profile name for this mode.
    pub fn profile(&self) -> &'static str {
        match self {
            TravelMode::Drive => "driving-car",
            TravelMode::Walk => "foot-walking",
            TravelMode::Bike => "cycling-regular",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Drive => "drive",
            TravelMode::Walk => "walk",
            TravelMode::Bike => "bike",
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reachability polygon: the area reachable from `place` within
/// `minutes` using `mode`, as returned by the routing service.
#[derive(Debug, Clone)]
pub struct Isochrone {
    pub place: Place,
    pub mode: TravelMode,
    pub minutes: u32,
    pub polygon: Polygon<f64>,
}

// Reuse a single reqwest::Client for multiple requests
lazy_static::lazy_static! {
    static ref CLIENT: reqwest::Client = reqwest::Client::new();
}

async fn request_batch(
    endpoint: &str,
    api_key: Option<&str>,
    profile: &str,
    locations: &[[f64; 2]],
    range_seconds: u32,
) -> Result<String> {
    let url = format!("{}/v2/isochrones/{}", endpoint.trim_end_matches('/'), profile);
    let body = serde_json::json!({
        "locations": locations,
        "range": [range_seconds],
        "range_type": "time",
    });

    let mut request = CLIENT.post(&url).json(&body);
    if let Some(key) = api_key {
        request = request.header("Authorization", key);
    }

    let response = request.send().await?.error_for_status()?;
    Ok(response.text().await?)
}

// Maps each feature of the response back onto the place it was requested
// for via its group_index property.
fn parse_batch(
    body: &str,
    batch: &[Place],
    mode: TravelMode,
    minutes: u32,
) -> Result<Vec<Isochrone>> {
    let geojson: GeoJson = body.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(ReachError::IsochroneResponse {
            message: "expected a FeatureCollection".to_string(),
        });
    };

    let mut isochrones = Vec::new();
    for feature in collection.features {
        let index = feature
            .property("group_index")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| ReachError::IsochroneResponse {
                message: "feature without group_index".to_string(),
            })? as usize;

        let place = batch
            .get(index)
            .ok_or_else(|| ReachError::IsochroneResponse {
                message: format!("group_index {} out of range", index),
            })?;

        let Some(geometry) = feature.geometry else {
            tracing::debug!(place = %place.name, "isochrone feature without geometry");
            continue;
        };
        let polygon = utils::polygon_from_geojson_value(&geometry.value)?;

        isochrones.push(Isochrone {
            place: place.clone(),
            mode,
            minutes,
            polygon,
        });
    }

    Ok(isochrones)
}

/// Fetches one isochrone per place from the routing service.
///
/// Places are sent in batches of `batch_size` (the service caps locations
/// per request) with a fixed `batch_delay` in between to stay under the
/// rate limit. A failed batch is logged and skipped, the rest of the run
/// continues with whatever polygons were returned.
pub async fn fetch_isochrones(
    endpoint: &str,
    api_key: Option<&str>,
    places: &[Place],
    mode: TravelMode,
    minutes: u32,
    batch_size: usize,
    batch_delay: Duration,
) -> Vec<Isochrone> {
    let mut isochrones = Vec::new();
    let batches: Vec<&[Place]> = places.chunks(batch_size.max(1)).collect();
    let batch_count = batches.len();

    for (i, batch) in batches.into_iter().enumerate() {
        let locations: Vec<[f64; 2]> = batch.iter().map(|p| [p.lon, p.lat]).collect();

        tracing::debug!(
            %mode,
            minutes,
            batch = i + 1,
            of = batch_count,
            locations = locations.len(),
            "requesting isochrone batch"
        );

        match request_batch(endpoint, api_key, mode.profile(), &locations, minutes * 60).await {
            Ok(body) => match parse_batch(&body, batch, mode, minutes) {
                Ok(mut parsed) => isochrones.append(&mut parsed),
                Err(err) => {
                    tracing::warn!(%mode, minutes, error = %err, "isochrone batch unparsable, skipping");
                }
            },
            Err(err) => {
                tracing::warn!(%mode, minutes, error = %err, "isochrone batch failed, skipping");
            }
        }

        if i + 1 < batch_count {
            tokio::time::sleep(batch_delay).await;
        }
    }

    tracing::info!(%mode, minutes, count = isochrones.len(), "fetched isochrones");
    isochrones
}
