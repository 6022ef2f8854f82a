use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const CONFIG_PATH: &str = "config.toml";

/// MusicBrainz refuses search pages larger than this.
pub const MAX_RESULT_LIMIT: u32 = 100;
/// Below this the input task spins on `poll`.
pub const MIN_TICK_RATE_MS: u64 = 16;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub location: LocationConfig,
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub ui: UiConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct LocationConfig {
    pub use_device: bool,       // Read this machine's position from latitude/longitude
    pub latitude: Option<f64>,  // Decimal degrees, WGS84
    pub longitude: Option<f64>, // Decimal degrees, WGS84
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub geojs_url: String,
    pub nominatim_url: String,
    pub musicbrainz_url: String,
    pub user_agent: String, // MusicBrainz and Nominatim reject anonymous clients
    pub result_limit: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub recent_years: i32, // Bands formed at most this many years ago count as recent
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            geojs_url: "https://get.geojs.io/v1/ip/geo.json".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            musicbrainz_url: "https://musicbrainz.org".to_string(),
            user_agent: concat!("citybands-tui/", env!("CARGO_PKG_VERSION")).to_string(),
            result_limit: 50,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { recent_years: 10 }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 150 }
    }
}

impl LocationConfig {
    /// The configured device position, if enabled and in range.
    pub fn device_coordinates(&self) -> Option<Coordinates> {
        if !self.use_device {
            return None;
        }
        let (latitude, longitude) = (self.latitude?, self.longitude?);
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            warn!(
                "Configured position ({}, {}) is out of range, ignoring it.",
                latitude, longitude
            );
            return None;
        }
        Some(Coordinates {
            latitude,
            longitude,
        })
    }
}

impl Config {
    /// Pulls numeric settings back into the range the app can work with.
    pub fn clamped(mut self) -> Self {
        let limit = self.api.result_limit.clamp(1, MAX_RESULT_LIMIT);
        if limit != self.api.result_limit {
            warn!(
                "api.result_limit {} is out of range, using {}.",
                self.api.result_limit, limit
            );
            self.api.result_limit = limit;
        }
        if self.ui.tick_rate_ms < MIN_TICK_RATE_MS {
            warn!(
                "ui.tick_rate_ms {} is too low, using {}.",
                self.ui.tick_rate_ms, MIN_TICK_RATE_MS
            );
            self.ui.tick_rate_ms = MIN_TICK_RATE_MS;
        }
        if self.search.recent_years < 0 {
            warn!("search.recent_years cannot be negative, using 0.");
            self.search.recent_years = 0;
        }
        self
    }

    /// Loads config.toml from the working directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        Self::load_from(CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if let Ok(content) = fs::read_to_string(path) {
            match toml::from_str::<Config>(&content) {
                Ok(config) => return config.clamped(),
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    return Config::default();
                }
            }
        }

        let default_config = Config::default();

        // Save default config to disk for the user to edit later
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(path, toml_string).is_err() {
                    warn!("Could not write default {} to disk.", path.display());
                }
            }
            Err(e) => warn!("Could not serialize default configuration: {}", e),
        }

        info!("Loaded default configuration.");
        default_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path);
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_from(&path);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[location]\nuse_device = true\nlatitude = 45.52\nlongitude = -122.68\n",
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert!(config.location.use_device);
        assert_eq!(config.api.result_limit, 50);
        assert_eq!(config.search.recent_years, 10);
        assert_eq!(
            config.location.device_coordinates(),
            Some(Coordinates {
                latitude: 45.52,
                longitude: -122.68
            })
        );
    }

    #[test]
    fn unparseable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn out_of_range_numbers_are_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[api]\nresult_limit = 500\n[ui]\ntick_rate_ms = 0\n[search]\nrecent_years = -3\n",
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.api.result_limit, MAX_RESULT_LIMIT);
        assert_eq!(config.ui.tick_rate_ms, MIN_TICK_RATE_MS);
        assert_eq!(config.search.recent_years, 0);

        fs::write(&path, "[api]\nresult_limit = 0\n").unwrap();
        assert_eq!(Config::load_from(&path).api.result_limit, 1);
    }

    #[test]
    fn in_range_numbers_are_kept() {
        let config = Config::default().clamped();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn device_coordinates_need_opt_in_and_valid_range() {
        let mut location = LocationConfig {
            use_device: false,
            latitude: Some(45.0),
            longitude: Some(-122.0),
        };
        assert_eq!(location.device_coordinates(), None);

        location.use_device = true;
        assert!(location.device_coordinates().is_some());

        location.latitude = Some(123.0);
        assert_eq!(location.device_coordinates(), None);

        location.latitude = None;
        assert_eq!(location.device_coordinates(), None);
    }
}
