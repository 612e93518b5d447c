// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Minimal GeoJSON helpers for footprint calculations.
//!
//! Only `Polygon` and `MultiPolygon` geometries are handled. Coordinates that
//! fit in lon/lat bounds are treated as WGS84 degrees and projected onto a
//! local equirectangular plane before measuring; anything else is taken as
//! planar meters.

use serde_json::{json, Value};

const EARTH_RADIUS_M: f64 = 6_371_008.8;

pub type Point = [f64; 2];
pub type Ring = Vec<Point>;
/// Outer ring followed by holes
pub type Polygon = Vec<Ring>;

/// Axis-aligned bounds as `[min_x, min_y, max_x, max_y]`.
pub type Bounds = [f64; 4];

/// Polygons of a GeoJSON `Polygon` or `MultiPolygon` geometry.
pub fn polygons(geometry: &Value) -> Result<Vec<Polygon>, String> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry has no type")?;
    let coordinates = geometry
        .get("coordinates")
        .ok_or("geometry has no coordinates")?;

    match kind {
        "Polygon" => Ok(vec![parse_polygon(coordinates)?]),
        "MultiPolygon" => coordinates
            .as_array()
            .ok_or("MultiPolygon coordinates must be an array")?
            .iter()
            .map(parse_polygon)
            .collect(),
        other => Err(format!("unsupported geometry type '{}'", other)),
    }
}

fn parse_polygon(value: &Value) -> Result<Polygon, String> {
    value
        .as_array()
        .ok_or("polygon coordinates must be an array of rings")?
        .iter()
        .map(|ring| {
            ring.as_array()
                .ok_or_else(|| "ring must be an array of positions".to_string())?
                .iter()
                .map(parse_point)
                .collect()
        })
        .collect()
}

fn parse_point(value: &Value) -> Result<Point, String> {
    let position = value.as_array().ok_or("position must be an array")?;
    match (
        position.first().and_then(Value::as_f64),
        position.get(1).and_then(Value::as_f64),
    ) {
        (Some(x), Some(y)) => Ok([x, y]),
        _ => Err("position must hold two numbers".to_string()),
    }
}

fn is_geographic(polygons: &[Polygon]) -> bool {
    polygons
        .iter()
        .flatten()
        .flatten()
        .all(|[x, y]| x.abs() <= 180.0 && y.abs() <= 90.0)
}

fn shoelace(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..ring.len() {
        let [x1, y1] = ring[i];
        let [x2, y2] = ring[(i + 1) % ring.len()];
        twice_area += x1 * y2 - x2 * y1;
    }
    (twice_area / 2.0).abs()
}

fn project(ring: &[Point], reference_lat: f64) -> Ring {
    let scale = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
    let cos_lat = reference_lat.to_radians().cos();
    ring.iter()
        .map(|[lon, lat]| [lon * scale * cos_lat, lat * scale])
        .collect()
}

/// Footprint area in square meters (outer rings minus holes).
pub fn planar_area(geometry: &Value) -> Result<f64, String> {
    let polygons = polygons(geometry)?;
    let geographic = is_geographic(&polygons);

    let area = polygons
        .iter()
        .map(|polygon| {
            let reference_lat = polygon
                .first()
                .map(|outer| outer.iter().map(|p| p[1]).sum::<f64>() / outer.len().max(1) as f64)
                .unwrap_or(0.0);
            polygon
                .iter()
                .enumerate()
                .map(|(i, ring)| {
                    let ring_area = if geographic {
                        shoelace(&project(ring, reference_lat))
                    } else {
                        shoelace(ring)
                    };
                    if i == 0 {
                        ring_area
                    } else {
                        -ring_area
                    }
                })
                .sum::<f64>()
                .max(0.0)
        })
        .sum();

    Ok(area)
}

/// Bounds of one geometry, if it has any coordinates.
pub fn bounds(geometry: &Value) -> Option<Bounds> {
    let polygons = polygons(geometry).ok()?;
    merge_bounds(polygons.iter().flatten().flatten().map(|&[x, y]| [x, y, x, y]))
}

/// Union of many bounds.
pub fn merge_bounds<I: IntoIterator<Item = Bounds>>(items: I) -> Option<Bounds> {
    items.into_iter().reduce(|a, b| {
        [
            a[0].min(b[0]),
            a[1].min(b[1]),
            a[2].max(b[2]),
            a[3].max(b[3]),
        ]
    })
}

pub fn bounds_intersect(a: &Bounds, b: &Bounds) -> bool {
    a[0] <= b[2] && b[0] <= a[2] && a[1] <= b[3] && b[1] <= a[3]
}

pub fn bounds_contain(bounds: &Bounds, point: Point) -> bool {
    point[0] >= bounds[0] && point[0] <= bounds[2] && point[1] >= bounds[1] && point[1] <= bounds[3]
}

pub fn bounds_center(bounds: &Bounds) -> Point {
    [(bounds[0] + bounds[2]) / 2.0, (bounds[1] + bounds[3]) / 2.0]
}

/// Closed rectangular GeoJSON polygon covering `bounds`.
pub fn bounds_polygon(bounds: &Bounds) -> Value {
    let [min_x, min_y, max_x, max_y] = *bounds;
    json!({
        "type": "Polygon",
        "coordinates": [[
            [min_x, min_y],
            [max_x, min_y],
            [max_x, max_y],
            [min_x, max_y],
            [min_x, min_y]
        ]]
    })
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Value {
        bounds_polygon(&[0.0, 0.0, size, size])
    }

    #[test]
    fn test_planar_square_area() {
        // 300 x 300 m square in projected coordinates
        let geometry = bounds_polygon(&[500_000.0, 4_000_000.0, 500_300.0, 4_000_300.0]);
        assert!((planar_area(&geometry).unwrap() - 90_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_polygon_with_hole() {
        let geometry = json!({
            "type": "Polygon",
            "coordinates": [
                [[1000.0, 1000.0], [1020.0, 1000.0], [1020.0, 1020.0], [1000.0, 1020.0], [1000.0, 1000.0]],
                [[1005.0, 1005.0], [1010.0, 1005.0], [1010.0, 1010.0], [1005.0, 1010.0], [1005.0, 1005.0]]
            ]
        });
        assert!((planar_area(&geometry).unwrap() - 375.0).abs() < 1e-6);
    }

    #[test]
    fn test_geographic_area_is_projected() {
        // ~0.0001 degree square near the equator is about 11.1 m per side
        let geometry = bounds_polygon(&[0.0, 0.0, 0.0001, 0.0001]);
        let area = planar_area(&geometry).unwrap();
        assert!(area > 120.0 && area < 126.0, "area was {}", area);
    }

    #[test]
    fn test_multipolygon_sums_parts() {
        let a = square(1.0);
        let geometry = json!({
            "type": "MultiPolygon",
            "coordinates": [a["coordinates"].clone(), a["coordinates"].clone()]
        });
        let single = planar_area(&a).unwrap();
        assert!((planar_area(&geometry).unwrap() - 2.0 * single).abs() < 1e-6);
    }

    #[test]
    fn test_unsupported_geometry() {
        let point = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        assert_eq!(
            planar_area(&point).unwrap_err(),
            "unsupported geometry type 'Point'"
        );
        assert!(planar_area(&json!({})).is_err());
    }

    #[test]
    fn test_bounds_helpers() {
        let a = bounds(&square(2.0)).unwrap();
        assert_eq!(a, [0.0, 0.0, 2.0, 2.0]);
        let b = [1.0, 1.0, 3.0, 3.0];
        assert!(bounds_intersect(&a, &b));
        assert!(!bounds_intersect(&a, &[5.0, 5.0, 6.0, 6.0]));
        assert_eq!(merge_bounds([a, b]), Some([0.0, 0.0, 3.0, 3.0]));
        assert_eq!(bounds_center(&a), [1.0, 1.0]);
        assert!(bounds_contain(&a, [2.0, 0.5]));
        assert_eq!(round_to(1.23456, 2), 1.23);
    }
}
