use std::fs;
use std::path::Path;

use geojson::{Feature, FeatureCollection};
use serde_json::{json, Map};

use crate::combine::RegionSet;
use crate::error::Result;
use crate::utils;

// Yellow-to-red ramp indexed by satisfied-criteria count
const COLOR_RAMP: [&str; 6] = [
    "#ffffb2", "#fed976", "#feb24c", "#fd8d3c", "#f03b20", "#bd0026",
];

/// Color for a region satisfying `count` criteria. Counts past the end of
/// the ramp reuse its darkest entry.
pub fn ramp_color(count: usize) -> &'static str {
    let index = count.saturating_sub(1).min(COLOR_RAMP.len() - 1);
    COLOR_RAMP[index]
}

fn region_to_feature(set: &RegionSet) -> Feature {
    let mut properties = Map::new();
    properties.insert("title".to_string(), json!(set.title()));
    properties.insert("criteria".to_string(), json!(set.labels));
    properties.insert("count".to_string(), json!(set.count()));
    properties.insert("color".to_string(), json!(ramp_color(set.count())));

    Feature {
        bbox: None,
        geometry: Some(utils::multipolygon_to_geometry(&set.geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// All region sets as one GeoJSON FeatureCollection.
pub fn to_feature_collection(sets: &[RegionSet]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: sets.iter().map(region_to_feature).collect(),
        foreign_members: None,
    }
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<title>reachmap</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map { height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map('map').setView([__CENTER_LAT__, __CENTER_LON__], 12);
L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
    maxZoom: 19,
    attribution: '&copy; OpenStreetMap contributors'
}).addTo(map);

var regionSets = __REGION_SETS__;
var overlays = {};
regionSets.forEach(function (entry) {
    var layer = L.geoJSON(entry.feature, {
        style: {
            color: entry.color,
            fillColor: entry.color,
            fillOpacity: 0.35,
            weight: 1
        }
    }).bindPopup(entry.title + ' (' + entry.count + ' criteria)');
    overlays[entry.title] = layer;
    layer.addTo(map);
});
L.control.layers(null, overlays, { collapsed: false }).addTo(map);
</script>
</body>
</html>
"#;

/// Renders the region sets as a self-contained Leaflet page with one
/// togglable overlay per set.
pub fn render_html(sets: &[RegionSet], center_lat: f64, center_lon: f64) -> Result<String> {
    let entries: Vec<serde_json::Value> = sets
        .iter()
        .map(|set| {
            let feature = serde_json::to_value(region_to_feature(set))?;
            Ok(json!({
                "title": set.title(),
                "count": set.count(),
                "color": ramp_color(set.count()),
                "feature": feature,
            }))
        })
        .collect::<Result<_>>()?;

    let html = HTML_TEMPLATE
        .replace("__CENTER_LAT__", &center_lat.to_string())
        .replace("__CENTER_LON__", &center_lon.to_string())
        .replace("__REGION_SETS__", &serde_json::to_string(&entries)?);

    Ok(html)
}

pub fn write_html(path: &Path, sets: &[RegionSet], center_lat: f64, center_lon: f64) -> Result<()> {
    let html = render_html(sets, center_lat, center_lon)?;
    fs::write(path, html)?;
    Ok(())
}

pub fn write_geojson(path: &Path, sets: &[RegionSet]) -> Result<()> {
    let collection = to_feature_collection(sets);
    fs::write(path, collection.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Polygon};

    fn region(labels: &[&str]) -> RegionSet {
        RegionSet {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            geometry: MultiPolygon(vec![Polygon::new(
                LineString::from(vec![
                    (11.5, 48.1),
                    (11.6, 48.1),
                    (11.6, 48.2),
                    (11.5, 48.2),
                    (11.5, 48.1),
                ]),
                vec![],
            )]),
        }
    }

    #[test]
    fn ramp_clamps_to_darkest_color() {
        assert_eq!(ramp_color(1), "#ffffb2");
        assert_eq!(ramp_color(6), "#bd0026");
        assert_eq!(ramp_color(20), "#bd0026");
    }

    #[test]
    fn feature_collection_carries_properties() {
        let sets = vec![
            region(&["supermarket-drive-10min"]),
            region(&["supermarket-drive-10min", "school-walk-15min"]),
        ];
        let collection = to_feature_collection(&sets);

        assert_eq!(collection.features.len(), 2);
        let props = collection.features[1].properties.as_ref().unwrap();
        assert_eq!(props["count"], json!(2));
        assert_eq!(props["color"], json!(ramp_color(2)));
        assert_eq!(
            props["title"],
            json!("supermarket-drive-10min ∩ school-walk-15min")
        );
    }

    #[test]
    fn html_embeds_layers_and_center() {
        let sets = vec![region(&["supermarket-drive-10min"])];
        let html = render_html(&sets, 48.14, 11.58).unwrap();

        assert!(html.contains("setView([48.14, 11.58]"));
        assert!(html.contains("supermarket-drive-10min"));
        assert!(html.contains("L.control.layers"));
        assert!(!html.contains("__REGION_SETS__"));
    }
}
