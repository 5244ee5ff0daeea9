use crate::settings::Settings;
use eyre::{bail, Result};
use jobclock_common::domain::GeoFix;

/// Source of GPS fixes for timer start/stop. A failed fix aborts the
/// operation; timers are never started without a location.
pub trait LocationProvider: Send + Sync {
    fn current_fix(&self) -> Result<GeoFix>;
}

/// Fixed coordinates from the client settings.
pub struct ConfiguredLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
    accuracy: Option<f64>,
}

impl ConfiguredLocation {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            latitude: settings.latitude,
            longitude: settings.longitude,
            accuracy: settings.accuracy,
        }
    }
}

impl LocationProvider for ConfiguredLocation {
    fn current_fix(&self) -> Result<GeoFix> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                Ok(GeoFix::new(latitude, longitude, self.accuracy.unwrap_or(50.0)))
            }
            _ => bail!(
                "no location configured; set latitude/longitude in the client config"
            ),
        }
    }
}

/// Fixed fix for tests.
pub struct StaticLocation(pub GeoFix);

impl LocationProvider for StaticLocation {
    fn current_fix(&self) -> Result<GeoFix> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobclock_common::domain::GeoAccuracy;

    #[test]
    fn unconfigured_location_fails_the_fix() {
        let provider = ConfiguredLocation {
            latitude: None,
            longitude: None,
            accuracy: None,
        };
        assert!(provider.current_fix().is_err());
    }

    #[test]
    fn configured_location_classifies_accuracy() {
        let provider = ConfiguredLocation {
            latitude: Some(49.2827),
            longitude: Some(-123.1207),
            accuracy: Some(8.0),
        };
        let fix = provider.current_fix().unwrap();
        assert_eq!(fix.accuracy_class, GeoAccuracy::Good);
    }
}
