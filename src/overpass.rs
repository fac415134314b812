use serde::Deserialize;

use crate::cache;
use crate::error::Result;

/// Place categories that can be searched for on OpenStreetMap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Supermarket,
    School,
    Kindergarten,
    Hospital,
    Pharmacy,
}

impl Category {
    /// The Overpass tag selector matching this category.
    pub fn osm_selector(&self) -> &'static str {
        match self {
            Category::Supermarket => "[\"shop\"=\"supermarket\"]",
            Category::School => "[\"amenity\"=\"school\"]",
            Category::Kindergarten => "[\"amenity\"=\"kindergarten\"]",
            Category::Hospital => "[\"amenity\"=\"hospital\"]",
            Category::Pharmacy => "[\"amenity\"=\"pharmacy\"]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Supermarket => "supermarket",
            Category::School => "school",
            Category::Kindergarten => "kindergarten",
            Category::Hospital => "hospital",
            Category::Pharmacy => "pharmacy",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named point of interest extracted from an Overpass result.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub category: Category,
}

// XML shape of an Overpass `out center;` response. Nodes carry their own
// coordinates, ways carry a synthetic <center> element.
#[derive(Debug, Deserialize)]
struct XmlData {
    #[serde(rename = "node", default)]
    nodes: Vec<XmlNode>,
    #[serde(rename = "way", default)]
    ways: Vec<XmlWay>,
}

#[derive(Debug, Deserialize, Clone)]
struct XmlNode {
    #[serde(rename = "@lat")]
    lat: f64,
    #[serde(rename = "@lon")]
    lon: f64,
    #[serde(rename = "tag", default)]
    tags: Vec<XmlTag>,
}

#[derive(Debug, Deserialize, Clone)]
struct XmlWay {
    #[serde(rename = "@id")]
    id: i64,
    #[serde(rename = "center")]
    center: Option<XmlCenter>,
    #[serde(rename = "tag", default)]
    tags: Vec<XmlTag>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct XmlCenter {
    #[serde(rename = "@lat")]
    lat: f64,
    #[serde(rename = "@lon")]
    lon: f64,
}

#[derive(Debug, Deserialize, Clone)]
struct XmlTag {
    #[serde(rename = "@k")]
    key: String,
    #[serde(rename = "@v")]
    value: String,
}

fn name_from_tags(tags: &[XmlTag]) -> String {
    tags.iter()
        .find(|tag| tag.key == "name")
        .map(|tag| tag.value.clone())
        .unwrap_or_else(|| "unnamed".to_string())
}

// Function to construct a bounding box from a single lat/lon pair
pub fn bbox_from_point(lat: f64, lon: f64, dist: f64) -> String {
    const EARTH_RADIUS_M: f64 = 6_371_009.0;

    // Calculate deltas
    let delta_lat = (dist / EARTH_RADIUS_M) * (180.0 / std::f64::consts::PI);
    let delta_lon = (dist / EARTH_RADIUS_M) * (180.0 / std::f64::consts::PI)
        / (lat * std::f64::consts::PI / 180.0).cos();

    // Calculate bounding box
    let north = lat + delta_lat;
    let south = lat - delta_lat;
    let east = lon + delta_lon;
    let west = lon - delta_lon;

    // Construct bbox string for the Overpass API query
    format!("{},{},{},{}", south, west, north, east)
}

// Function to create the Overpass query string
pub fn create_overpass_query(bbox: &str, category: Category) -> String {
    let selector = category.osm_selector();
    format!(
        "[out:xml][timeout:25];(node{sel}({bbox});way{sel}({bbox}););out center;",
        sel = selector,
        bbox = bbox
    )
}

// Reuse a single reqwest::Client for multiple requests
lazy_static::lazy_static! {
    static ref CLIENT: reqwest::Client = reqwest::Client::new();
}

// Function to make request to the Overpass API
pub async fn make_request(url: &str, query: &str) -> Result<String> {
    let response = CLIENT
        .post(url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(query.to_string())
        .send()
        .await?
        .error_for_status()?;

    Ok(response.text().await?)
}

// Function to parse the XML response into places
fn parse_places(xml_data: &str, category: Category) -> Result<Vec<Place>> {
    let root: XmlData = quick_xml::de::from_str(xml_data)?;
    let mut places = Vec::new();

    for node in &root.nodes {
        places.push(Place {
            name: name_from_tags(&node.tags),
            lon: node.lon,
            lat: node.lat,
            category,
        });
    }

    for way in &root.ways {
        // Ways without a resolved centroid are unusable as points
        let Some(center) = way.center else {
            tracing::debug!(way = way.id, "skipping way without center");
            continue;
        };
        places.push(Place {
            name: name_from_tags(&way.tags),
            lon: center.lon,
            lat: center.lat,
            category,
        });
    }

    Ok(places)
}

/// Fetches all places of `category` inside the bbox from the Overpass API.
///
/// Failures are logged and turn into an empty list so that a single dead
/// criterion does not abort the whole run.
pub async fn fetch_places(endpoint: &str, bbox: &str, category: Category) -> Vec<Place> {
    let query = create_overpass_query(bbox, category);

    // Check the cache first
    if let Some(places) = cache::check_cache(&query) {
        tracing::debug!(%category, hits = places.len(), "overpass cache hit");
        return places;
    }

    let body = match make_request(endpoint, &query).await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(%category, error = %err, "overpass request failed, continuing without places");
            return Vec::new();
        }
    };

    match parse_places(&body, category) {
        Ok(places) => {
            tracing::info!(%category, count = places.len(), "fetched places");
            cache::insert_into_cache(query, places.clone());
            places
        }
        Err(err) => {
            tracing::warn!(%category, error = %err, "overpass response unparsable, continuing without places");
            Vec::new()
        }
    }
}
