use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{Geometry, Value};

use crate::error::{ReachError, Result};

fn ring_to_positions(ring: &LineString<f64>) -> Vec<Vec<f64>> {
    ring.0.iter().map(|coord| vec![coord.x, coord.y]).collect()
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    let mut rings = vec![ring_to_positions(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring_to_positions));
    rings
}

// Convert polygon to a GeoJSON geometry
pub fn polygon_to_geometry(polygon: &Polygon<f64>) -> Geometry {
    Geometry::new(Value::Polygon(polygon_rings(polygon)))
}

// Convert multipolygon to a GeoJSON geometry
pub fn multipolygon_to_geometry(multipolygon: &MultiPolygon<f64>) -> Geometry {
    let polygons = multipolygon.0.iter().map(polygon_rings).collect();
    Geometry::new(Value::MultiPolygon(polygons))
}

/// Extracts a `geo::Polygon` from a GeoJSON geometry value. Only the
/// exterior ring is kept, matching how the routing service draws
/// isochrone boundaries.
pub fn polygon_from_geojson_value(value: &Value) -> Result<Polygon<f64>> {
    let Value::Polygon(rings) = value else {
        return Err(ReachError::IsochroneResponse {
            message: "expected a Polygon geometry".to_string(),
        });
    };

    let exterior = rings
        .first()
        .ok_or_else(|| ReachError::IsochroneResponse {
            message: "polygon without an exterior ring".to_string(),
        })?;

    let coords: Vec<Coord<f64>> = exterior
        .iter()
        .map(|position| {
            if position.len() < 2 {
                return Err(ReachError::IsochroneResponse {
                    message: "position with fewer than two ordinates".to_string(),
                });
            }
            Ok(Coord {
                x: position[0],
                y: position[1],
            })
        })
        .collect::<Result<_>>()?;

    Ok(Polygon::new(LineString::from(coords), vec![]))
}
