use async_trait::async_trait;
use nursery_common::GeoPoint;
use thiserror::Error;

/// The device geolocation service. Both calls may take arbitrary latency; either may fail due to
/// permissions or hardware, and callers decide whether a failure halts the flow (checkout,
/// publisher start) or is skipped (a single publisher tick).
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Checks, and if necessary requests, the location permission.
    async fn ensure_permission(&self) -> Result<(), LocationError>;

    /// One-shot read of the device's current position.
    async fn current_position(&self) -> Result<GeoPoint, LocationError>;
}

#[derive(Debug, Clone, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Could not read the device position. {0}")]
    Unavailable(String),
}

impl LocationError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, LocationError::PermissionDenied)
    }
}
