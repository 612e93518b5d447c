/// Priority assigned to a method that does not declare one
pub const DEFAULT_PRIORITY: u32 = 999;
/// Fallback worker count when neither the config nor the host reports one
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
/// Service name under which the elevation/raster handle is registered
pub const RASTER_SERVICE: &str = "raster_service";
/// Service name under which the spatial census query handle is registered
pub const CENSUS_SERVICE: &str = "census_service";
