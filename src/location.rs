use crate::models::LocationData;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    PermissionDenied,
    Unavailable(String),
    Timeout,
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::PermissionDenied => f.write_str("location permission denied"),
            LocationError::Unavailable(reason) => write!(f, "location unavailable: {reason}"),
            LocationError::Timeout => f.write_str("location request timed out"),
        }
    }
}

impl std::error::Error for LocationError {}

/// One-shot position lookup.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<LocationData, LocationError>;
}

/// Position reported by the submitting client. `None` means the client could
/// not or would not share one.
#[derive(Debug, Clone, Default)]
pub struct ReportedPosition(pub Option<LocationData>);

#[async_trait]
impl LocationSource for ReportedPosition {
    async fn current_position(&self) -> Result<LocationData, LocationError> {
        let position = self.0.clone().ok_or(LocationError::PermissionDenied)?;
        let valid = position.latitude.is_finite()
            && position.longitude.is_finite()
            && (-90.0..=90.0).contains(&position.latitude)
            && (-180.0..=180.0).contains(&position.longitude);
        if !valid {
            return Err(LocationError::Unavailable(format!(
                "coordinates out of range: {}, {}",
                position.latitude, position.longitude
            )));
        }
        Ok(position)
    }
}

/// Single attempt, bounded by `limit`. Any failure is logged and dropped.
pub async fn acquire_location(source: &dyn LocationSource, limit: Duration) -> Option<LocationData> {
    let result = match tokio::time::timeout(limit, source.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(LocationError::Timeout),
    };
    match result {
        Ok(location) => Some(location),
        Err(err) => {
            warn!("proceeding without location: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverAnswers;

    #[async_trait]
    impl LocationSource for NeverAnswers {
        async fn current_position(&self) -> Result<LocationData, LocationError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn reported_position_is_returned() {
        let source = ReportedPosition(Some(LocationData {
            latitude: -7.05,
            longitude: 112.73,
            address: None,
        }));
        let location = acquire_location(&source, Duration::from_secs(1)).await;
        assert_eq!(location.map(|l| l.latitude), Some(-7.05));
    }

    #[tokio::test]
    async fn denied_position_degrades_to_none() {
        let source = ReportedPosition(None);
        assert_eq!(
            source.current_position().await,
            Err(LocationError::PermissionDenied)
        );
        assert!(acquire_location(&source, Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_dropped() {
        let source = ReportedPosition(Some(LocationData {
            latitude: 123.0,
            longitude: 0.0,
            address: None,
        }));
        assert!(acquire_location(&source, Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let location = acquire_location(&NeverAnswers, Duration::from_millis(20)).await;
        assert!(location.is_none());
    }
}
