// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory service implementations backed by fixture data.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ServiceError;
use crate::traits::{
    CensusZone, ElevationService, ElevationStats, ServiceHandle, ServiceHandles,
    SpatialQueryService,
};
use crate::utils::geometry;

/// A rectangle of constant surface and terrain elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationTile {
    pub bounds: geometry::Bounds,
    pub dsm: f64,
    pub dtm: f64,
}

/// Answers with the first tile containing the geometry's bounding-box center.
#[derive(Debug, Clone, Default)]
pub struct MemoryElevationService {
    tiles: Vec<ElevationTile>,
}

impl MemoryElevationService {
    pub fn new(tiles: Vec<ElevationTile>) -> Self {
        Self { tiles }
    }
}

#[async_trait]
impl ElevationService for MemoryElevationService {
    async fn elevation_stats(&self, geometry: &Value) -> Result<ElevationStats, ServiceError> {
        let bounds = geometry::bounds(geometry).ok_or_else(|| {
            ServiceError::InvalidGeometry("expected a Polygon or MultiPolygon".to_string())
        })?;
        let center = geometry::bounds_center(&bounds);

        Ok(self
            .tiles
            .iter()
            .find(|tile| geometry::bounds_contain(&tile.bounds, center))
            .map(|tile| ElevationStats {
                dsm_mean: Some(tile.dsm),
                dtm_mean: Some(tile.dtm),
                pixel_count: 1,
            })
            .unwrap_or_default())
    }
}

/// Returns every zone whose bounds overlap the query polygon's bounds.
#[derive(Debug, Clone, Default)]
pub struct MemoryCensusService {
    zones: Vec<CensusZone>,
}

impl MemoryCensusService {
    pub fn new(zones: Vec<CensusZone>) -> Self {
        Self { zones }
    }
}

#[async_trait]
impl SpatialQueryService for MemoryCensusService {
    async fn zones_intersecting(&self, polygon: &Value) -> Result<Vec<CensusZone>, ServiceError> {
        let query = geometry::bounds(polygon).ok_or_else(|| {
            ServiceError::InvalidGeometry("expected a Polygon or MultiPolygon".to_string())
        })?;

        Ok(self
            .zones
            .iter()
            .filter(|zone| {
                geometry::bounds(&zone.geometry)
                    .map(|b| geometry::bounds_intersect(&b, &query))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

/// One named service in a fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceFixture {
    Elevation { tiles: Vec<ElevationTile> },
    SpatialQuery { zones: Vec<CensusZone> },
}

impl ServiceFixture {
    pub fn into_handle(self) -> ServiceHandle {
        match self {
            ServiceFixture::Elevation { tiles } => {
                ServiceHandle::Elevation(Arc::new(MemoryElevationService::new(tiles)))
            }
            ServiceFixture::SpatialQuery { zones } => {
                ServiceHandle::SpatialQuery(Arc::new(MemoryCensusService::new(zones)))
            }
        }
    }
}

/// Parse a JSON object mapping service names to fixtures.
pub fn services_from_json(json: &str) -> Result<ServiceHandles, serde_json::Error> {
    let fixtures: BTreeMap<String, ServiceFixture> = serde_json::from_str(json)?;
    Ok(fixtures
        .into_iter()
        .map(|(name, fixture)| (name, fixture.into_handle()))
        .collect())
}

/// Load service handles from a JSON fixture file.
pub fn load_service_fixtures<P: AsRef<Path>>(path: P) -> Result<ServiceHandles, ServiceError> {
    let path = path.as_ref();
    let fixture_error = |reason: String| ServiceError::Fixture {
        path: path.display().to_string(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| fixture_error(e.to_string()))?;
    services_from_json(&content).map_err(|e| fixture_error(e.to_string()))
}
