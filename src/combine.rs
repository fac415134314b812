use geo::{BooleanOps, MultiPolygon};
use serde::Deserialize;

use crate::overpass::Category;
use crate::routing::{Isochrone, TravelMode};

/// One proximity criterion: places of a category reachable within
/// `minutes` using `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Criterion {
    pub category: Category,
    pub mode: TravelMode,
    pub minutes: u32,
}

impl Criterion {
    pub fn label(&self) -> String {
        format!("{}-{}-{}min", self.category, self.mode, self.minutes)
    }
}

/// All isochrones fetched for one criterion.
#[derive(Debug, Clone)]
pub struct CriterionLayer {
    pub criterion: Criterion,
    pub isochrones: Vec<Isochrone>,
}

/// A region satisfying every criterion in `labels`, ranked by how many
/// that is.
#[derive(Debug, Clone)]
pub struct RegionSet {
    pub labels: Vec<String>,
    pub geometry: MultiPolygon<f64>,
}

impl RegionSet {
    pub fn count(&self) -> usize {
        self.labels.len()
    }

    pub fn title(&self) -> String {
        self.labels.join(" ∩ ")
    }
}

/// Unions all isochrones of one criterion into a single region.
/// A criterion without isochrones yields `None` and takes no part in any
/// downstream intersection.
pub fn union_criterion(isochrones: &[Isochrone]) -> Option<MultiPolygon<f64>> {
    let mut polygons = isochrones.iter().map(|iso| &iso.polygon);
    let first = polygons.next()?;

    let mut unioned = MultiPolygon::new(vec![first.clone()]);
    for polygon in polygons {
        unioned = unioned.union(&MultiPolygon::new(vec![polygon.clone()]));
    }
    Some(unioned)
}

fn intersect_all(regions: &[&MultiPolygon<f64>]) -> Option<MultiPolygon<f64>> {
    let (first, rest) = regions.split_first()?;
    let mut intersection = (*first).clone();
    for region in rest {
        intersection = intersection.intersection(region);
        if intersection.0.is_empty() {
            return None;
        }
    }
    Some(intersection)
}

/// Builds the full set of labeled regions: one union per non-empty
/// criterion, then one intersection per subset of criteria of size 2..N.
/// Subsets whose criteria never overlap are dropped.
pub fn combine(layers: &[CriterionLayer]) -> Vec<RegionSet> {
    let unions: Vec<(String, MultiPolygon<f64>)> = layers
        .iter()
        .filter_map(|layer| {
            let union = union_criterion(&layer.isochrones);
            if union.is_none() {
                tracing::warn!(
                    criterion = %layer.criterion.label(),
                    "criterion has no isochrones, leaving it out"
                );
            }
            union.map(|u| (layer.criterion.label(), u))
        })
        .collect();

    let mut region_sets: Vec<RegionSet> = unions
        .iter()
        .map(|(label, union)| RegionSet {
            labels: vec![label.clone()],
            geometry: union.clone(),
        })
        .collect();

    // Enumerate criteria subsets by bitmask, skipping singletons
    let n = unions.len();
    for mask in 1u32..(1 << n) {
        if mask.count_ones() < 2 {
            continue;
        }

        let members: Vec<usize> = (0..n).filter(|i| mask & (1 << i) != 0).collect();
        let regions: Vec<&MultiPolygon<f64>> =
            members.iter().map(|&i| &unions[i].1).collect();

        if let Some(geometry) = intersect_all(&regions) {
            region_sets.push(RegionSet {
                labels: members.iter().map(|&i| unions[i].0.clone()).collect(),
                geometry,
            });
        }
    }

    region_sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overpass::Place;
    use geo::{Area, LineString, Polygon};

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + size, y),
                (x + size, y + size),
                (x, y + size),
                (x, y),
            ]),
            vec![],
        )
    }

    fn isochrone(criterion: Criterion, polygon: Polygon<f64>) -> Isochrone {
        Isochrone {
            place: Place {
                name: "test".to_string(),
                lon: 0.0,
                lat: 0.0,
                category: criterion.category,
            },
            mode: criterion.mode,
            minutes: criterion.minutes,
            polygon,
        }
    }

    const SUPERMARKET_10: Criterion = Criterion {
        category: Category::Supermarket,
        mode: TravelMode::Drive,
        minutes: 10,
    };
    const SCHOOL_15: Criterion = Criterion {
        category: Category::School,
        mode: TravelMode::Walk,
        minutes: 15,
    };
    const PHARMACY_5: Criterion = Criterion {
        category: Category::Pharmacy,
        mode: TravelMode::Bike,
        minutes: 5,
    };

    #[test]
    fn criterion_label_format() {
        assert_eq!(SUPERMARKET_10.label(), "supermarket-drive-10min");
        assert_eq!(SCHOOL_15.label(), "school-walk-15min");
    }

    #[test]
    fn union_of_nothing_is_none() {
        assert!(union_criterion(&[]).is_none());
    }

    #[test]
    fn union_merges_overlapping_isochrones() {
        let isochrones = vec![
            isochrone(SUPERMARKET_10, square(0.0, 0.0, 2.0)),
            isochrone(SUPERMARKET_10, square(1.0, 0.0, 2.0)),
        ];
        let unioned = union_criterion(&isochrones).unwrap();

        // Two overlapping 2x2 squares cover 6 units, not 8
        assert_eq!(unioned.0.len(), 1);
        assert!((unioned.unsigned_area() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn re_union_is_idempotent() {
        let isochrones = vec![
            isochrone(SUPERMARKET_10, square(0.0, 0.0, 2.0)),
            isochrone(SUPERMARKET_10, square(5.0, 5.0, 2.0)),
        ];
        let unioned = union_criterion(&isochrones).unwrap();
        let again = unioned.union(&unioned);

        assert!((again.unsigned_area() - unioned.unsigned_area()).abs() < 1e-9);
    }

    #[test]
    fn combine_builds_unions_and_intersections() {
        let layers = vec![
            CriterionLayer {
                criterion: SUPERMARKET_10,
                isochrones: vec![isochrone(SUPERMARKET_10, square(0.0, 0.0, 2.0))],
            },
            CriterionLayer {
                criterion: SCHOOL_15,
                isochrones: vec![isochrone(SCHOOL_15, square(1.0, 1.0, 2.0))],
            },
        ];

        let region_sets = combine(&layers);

        // two singleton unions plus one pairwise intersection
        assert_eq!(region_sets.len(), 3);

        let pair = region_sets.iter().find(|set| set.count() == 2).unwrap();
        assert_eq!(
            pair.labels,
            vec!["supermarket-drive-10min", "school-walk-15min"]
        );
        assert!((pair.geometry.unsigned_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn full_intersection_is_subset_of_every_smaller_one() {
        let layers = vec![
            CriterionLayer {
                criterion: SUPERMARKET_10,
                isochrones: vec![isochrone(SUPERMARKET_10, square(0.0, 0.0, 3.0))],
            },
            CriterionLayer {
                criterion: SCHOOL_15,
                isochrones: vec![isochrone(SCHOOL_15, square(1.0, 0.0, 3.0))],
            },
            CriterionLayer {
                criterion: PHARMACY_5,
                isochrones: vec![isochrone(PHARMACY_5, square(2.0, 0.0, 3.0))],
            },
        ];

        let region_sets = combine(&layers);
        let full = region_sets.iter().find(|set| set.count() == 3).unwrap();

        for pair in region_sets.iter().filter(|set| set.count() == 2) {
            let clipped = pair.geometry.intersection(&full.geometry);
            assert!(
                (clipped.unsigned_area() - full.geometry.unsigned_area()).abs() < 1e-9,
                "three-way intersection must lie inside {}",
                pair.title()
            );
        }
    }

    #[test]
    fn empty_criterion_is_absent_downstream() {
        let layers = vec![
            CriterionLayer {
                criterion: SUPERMARKET_10,
                isochrones: vec![isochrone(SUPERMARKET_10, square(0.0, 0.0, 2.0))],
            },
            CriterionLayer {
                criterion: SCHOOL_15,
                isochrones: vec![],
            },
        ];

        let region_sets = combine(&layers);

        assert_eq!(region_sets.len(), 1);
        assert!(region_sets
            .iter()
            .all(|set| !set.labels.contains(&SCHOOL_15.label())));
    }

    #[test]
    fn disjoint_criteria_yield_no_intersection() {
        let layers = vec![
            CriterionLayer {
                criterion: SUPERMARKET_10,
                isochrones: vec![isochrone(SUPERMARKET_10, square(0.0, 0.0, 1.0))],
            },
            CriterionLayer {
                criterion: SCHOOL_15,
                isochrones: vec![isochrone(SCHOOL_15, square(10.0, 10.0, 1.0))],
            },
        ];

        let region_sets = combine(&layers);
        assert!(region_sets.iter().all(|set| set.count() == 1));
    }
}
