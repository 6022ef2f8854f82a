use crate::api::ArtistDirectory;
use crate::config::{ApiConfig, SearchConfig};
use crate::models::{filter_recent, Artist};
use chrono::Datelike;
use tracing::{error, info};

pub const NO_RESULTS: &str = "No results found";
pub const FETCH_FAILED: &str = "Failed to fetch data. Please try again later.";

/// Result of one band search, already filtered.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Found(Vec<Artist>),
    Empty,
    Failed,
}

/// Parameters shared by every band search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandQuery {
    pub limit: u32,
    pub recent_years: i32,
}

impl Default for BandQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            recent_years: 10,
        }
    }
}

impl BandQuery {
    pub fn from_config(api: &ApiConfig, search: &SearchConfig) -> Self {
        Self {
            limit: api.result_limit,
            recent_years: search.recent_years,
        }
    }

    /// Searches `city` for groups and keeps the ones formed recently
    /// relative to `current_year`.
    ///
    /// Returns `None` without touching the network when `city` is blank.
    pub async fn run(
        &self,
        directory: &dyn ArtistDirectory,
        city: &str,
        current_year: i32,
    ) -> Option<QueryOutcome> {
        let city = city.trim();
        if city.is_empty() {
            return None;
        }

        let outcome = match directory.search_groups(city, self.limit).await {
            Ok(artists) => {
                let fetched = artists.len();
                let recent = filter_recent(artists, current_year, self.recent_years);
                info!(
                    "{}: {} of {} groups formed since {}",
                    city,
                    recent.len(),
                    fetched,
                    current_year - self.recent_years
                );
                if recent.is_empty() {
                    QueryOutcome::Empty
                } else {
                    QueryOutcome::Found(recent)
                }
            }
            Err(e) => {
                error!("Error fetching bands: {:?}", e);
                QueryOutcome::Failed
            }
        };
        Some(outcome)
    }
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}
