// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Contracts for the external services calculators may depend on.
//!
//! Services are opaque collaborators. The orchestrator only checks that a
//! handle with the declared name is present; the calculator decides how to
//! use it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ServiceError;

/// Aggregate surface and terrain statistics for one geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElevationStats {
    /// Mean digital surface model value (roofs, canopy)
    pub dsm_mean: Option<f64>,
    /// Mean digital terrain model value (bare ground)
    pub dtm_mean: Option<f64>,
    pub pixel_count: usize,
}

impl ElevationStats {
    /// Surface minus terrain, when both are covered.
    pub fn relative_height(&self) -> Option<f64> {
        match (self.dsm_mean, self.dtm_mean) {
            (Some(dsm), Some(dtm)) => Some(dsm - dtm),
            _ => None,
        }
    }
}

/// A census zone returned by a spatial query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensusZone {
    pub zone_id: String,
    pub population: f64,
    /// GeoJSON geometry of the zone
    pub geometry: Value,
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,
}

#[async_trait]
pub trait ElevationService: Send + Sync {
    async fn elevation_stats(&self, geometry: &Value) -> Result<ElevationStats, ServiceError>;
}

#[async_trait]
pub trait SpatialQueryService: Send + Sync {
    async fn zones_intersecting(&self, polygon: &Value) -> Result<Vec<CensusZone>, ServiceError>;
}

/// A live service placed in the execution context under a name.
#[derive(Clone)]
pub enum ServiceHandle {
    Elevation(Arc<dyn ElevationService>),
    SpatialQuery(Arc<dyn SpatialQueryService>),
}

impl ServiceHandle {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceHandle::Elevation(_) => "elevation",
            ServiceHandle::SpatialQuery(_) => "spatial_query",
        }
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServiceHandle({})", self.kind())
    }
}

/// Service handles keyed by the name methods use in `depends_on`.
pub type ServiceHandles = HashMap<String, ServiceHandle>;
