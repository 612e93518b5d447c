pub mod calculator;
pub mod service;

pub use calculator::{Calculator, MethodOutcome};
pub use service::{
    CensusZone, ElevationService, ElevationStats, ServiceHandle, ServiceHandles,
    SpatialQueryService,
};
