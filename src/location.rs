//! User location resolution for City Bands Finder.
//!
//! [`acquire_city`] prefers the device position (reverse geocoded through
//! [`city_at`]) and falls back to IP geolocation when the device cannot
//! report one. Nothing in here returns an error: failures are logged and
//! folded into [`LocationOutcome::NotFound`].

use crate::api::{BoxFuture, IpLocator, ReverseGeocoder};
use crate::config::LocationConfig;
use crate::models::Coordinates;
use tracing::{error, info, warn};

/// Why the device could not report a position.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    Disabled,
    Unavailable(String),
}

/// The machine's own location capability.
pub trait DeviceLocator: Send + Sync {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, DeviceError>>;
}

/// Device position taken from the `[location]` section of config.toml.
pub struct ConfiguredDevice {
    location: LocationConfig,
}

impl ConfiguredDevice {
    pub fn new(location: LocationConfig) -> Self {
        Self { location }
    }
}

impl DeviceLocator for ConfiguredDevice {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, DeviceError>> {
        let position = if !self.location.use_device {
            Err(DeviceError::Disabled)
        } else {
            self.location.device_coordinates().ok_or_else(|| {
                DeviceError::Unavailable("no valid latitude/longitude configured".to_string())
            })
        };
        Box::pin(async move { position })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationSource {
    Device,
    IpAddress,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    Resolved { city: String, source: LocationSource },
    NotFound,
}

/// Reverse geocodes `coords` to a city, town or village name.
///
/// Lookup failures are logged and reported as `None`.
pub async fn city_at(geocoder: &dyn ReverseGeocoder, coords: Coordinates) -> Option<String> {
    match geocoder.reverse(coords).await {
        Ok(address) => {
            let place = address.place_name();
            if place.is_none() {
                warn!(
                    "No city, town or village at ({}, {})",
                    coords.latitude, coords.longitude
                );
            }
            place
        }
        Err(e) => {
            error!("Error fetching city name from coordinates: {:?}", e);
            None
        }
    }
}

/// Resolves the user's city, device first, IP geolocation second.
///
/// The IP service is only consulted when the device reports no position, and
/// then exactly once.
pub async fn acquire_city(
    device: &dyn DeviceLocator,
    ip_locator: &dyn IpLocator,
    geocoder: &dyn ReverseGeocoder,
) -> LocationOutcome {
    match device.current_position().await {
        Ok(coords) => {
            info!(
                "Device position ({}, {})",
                coords.latitude, coords.longitude
            );
            match city_at(geocoder, coords).await {
                Some(city) => LocationOutcome::Resolved {
                    city,
                    source: LocationSource::Device,
                },
                None => LocationOutcome::NotFound,
            }
        }
        Err(reason) => {
            info!("Device location unavailable ({:?}), using IP geolocation.", reason);
            match ip_locator.locate_city().await {
                Ok(Some(city)) => {
                    info!("IP geolocation successful - {}", city);
                    LocationOutcome::Resolved {
                        city,
                        source: LocationSource::IpAddress,
                    }
                }
                Ok(None) => {
                    warn!("IP geolocation returned no city.");
                    LocationOutcome::NotFound
                }
                Err(e) => {
                    error!("Error using IP geolocation service: {:?}", e);
                    LocationOutcome::NotFound
                }
            }
        }
    }
}
