use serde::{Deserialize, Serialize};

/// A position reported by the device location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One artist entry from the MusicBrainz search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub area: Option<Area>,
    #[serde(rename = "life-span", default)]
    pub life_span: Option<LifeSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeSpan {
    #[serde(default)]
    pub begin: Option<String>,
}

impl Artist {
    pub fn area_name(&self) -> Option<&str> {
        self.area.as_ref().map(|a| a.name.as_str())
    }

    /// Raw begin date as reported by the service ("2016", "2016-04-02", ...).
    pub fn begin(&self) -> Option<&str> {
        self.life_span.as_ref().and_then(|ls| ls.begin.as_deref())
    }

    /// Year the band was formed: the first four characters of the begin date.
    pub fn formation_year(&self) -> Option<i32> {
        let begin = self.begin()?;
        let prefix: String = begin.chars().take(4).collect();
        if prefix.chars().count() < 4 {
            return None;
        }
        prefix.parse::<i32>().ok()
    }

    /// True when the band was formed no more than `window_years` before `current_year`.
    pub fn is_recent(&self, current_year: i32, window_years: i32) -> bool {
        self.formation_year()
            .is_some_and(|year| current_year - year <= window_years)
    }
}

/// Keeps only the artists formed within the window, in their original order.
pub fn filter_recent(artists: Vec<Artist>, current_year: i32, window_years: i32) -> Vec<Artist> {
    artists
        .into_iter()
        .filter(|artist| artist.is_recent(current_year, window_years))
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct ArtistSearchResponse {
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeResponse {
    #[serde(default)]
    pub address: Address,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
}

impl Address {
    /// City, else town, else village. Empty strings count as missing.
    pub fn place_name(&self) -> Option<String> {
        [&self.city, &self.town, &self.village]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
            .cloned()
    }
}

#[derive(Debug, Deserialize)]
pub struct IpGeoResponse {
    pub city: Option<String>,
}
