//! HTTP clients for the three public services the app talks to.
//!
//! Each service sits behind a small trait so the pipeline in
//! [`location`](crate::location) and [`bands`](crate::bands) can be driven by
//! in-memory fakes in tests.

use crate::config::ApiConfig;
use crate::models::{
    Address, Artist, ArtistSearchResponse, Coordinates, IpGeoResponse, ReverseGeocodeResponse,
};
use color_eyre::{eyre::WrapErr, Result};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Artist search scoped to an area.
pub trait ArtistDirectory: Send + Sync {
    /// Group-type artists whose area matches `area`, at most `limit` of them.
    fn search_groups<'a>(&'a self, area: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<Artist>>>;
}

/// Coordinates to address lookup.
pub trait ReverseGeocoder: Send + Sync {
    fn reverse(&self, coords: Coordinates) -> BoxFuture<'_, Result<Address>>;
}

/// Coarse location from the caller's public IP.
pub trait IpLocator: Send + Sync {
    fn locate_city(&self) -> BoxFuture<'_, Result<Option<String>>>;
}

fn build_client(user_agent: &str) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .build()
        .wrap_err("failed to build HTTP client")
}

pub struct MusicBrainzProvider {
    client: Client,
    base_url: String,
}

impl MusicBrainzProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch_groups(&self, area: &str, limit: u32) -> Result<Vec<Artist>> {
        let url = format!("{}/ws/2/artist/", self.base_url.trim_end_matches('/'));
        let query = format!("area:{} AND type:group", area);
        let limit = limit.to_string();
        debug!("Searching MusicBrainz: {}", query);

        let res = self
            .client
            .get(url)
            .query(&[
                ("query", query.as_str()),
                ("fmt", "json"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<ArtistSearchResponse>()
            .await?;

        Ok(res.artists)
    }
}

impl ArtistDirectory for MusicBrainzProvider {
    fn search_groups<'a>(&'a self, area: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<Artist>>> {
        Box::pin(self.fetch_groups(area, limit))
    }
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch_address(&self, coords: Coordinates) -> Result<Address> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let res = self
            .client
            .get(url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<ReverseGeocodeResponse>()
            .await?;

        Ok(res.address)
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    fn reverse(&self, coords: Coordinates) -> BoxFuture<'_, Result<Address>> {
        Box::pin(self.fetch_address(coords))
    }
}

pub struct GeoJsLocator {
    client: Client,
    url: String,
}

impl GeoJsLocator {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn fetch_city(&self) -> Result<Option<String>> {
        let res = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<IpGeoResponse>()
            .await?;

        Ok(res.city.filter(|c| !c.trim().is_empty()))
    }
}

impl IpLocator for GeoJsLocator {
    fn locate_city(&self) -> BoxFuture<'_, Result<Option<String>>> {
        Box::pin(self.fetch_city())
    }
}

/// The live HTTP collaborators, sharing one connection pool.
#[derive(Clone)]
pub struct WebServices {
    pub directory: Arc<dyn ArtistDirectory>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub ip_locator: Arc<dyn IpLocator>,
}

impl WebServices {
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        let client = build_client(&api.user_agent)?;
        Ok(Self {
            directory: Arc::new(MusicBrainzProvider::new(
                client.clone(),
                api.musicbrainz_url.clone(),
            )),
            geocoder: Arc::new(NominatimGeocoder::new(
                client.clone(),
                api.nominatim_url.clone(),
            )),
            ip_locator: Arc::new(GeoJsLocator::new(client, api.geojs_url.clone())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one request with `body` and hands back its request line.
    async fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            let request = String::from_utf8_lossy(&request).into_owned();
            request.lines().next().unwrap_or_default().to_string()
        });

        (base_url, handle)
    }

    fn client() -> Client {
        build_client("citybands-tui/test").unwrap()
    }

    #[tokio::test]
    async fn musicbrainz_search_request_shape() {
        let (base_url, request) = serve_once(
            r#"{"artists":[{"id":"1","name":"Glass Harbor","life-span":{"begin":"2016"}}]}"#,
        )
        .await;
        let provider = MusicBrainzProvider::new(client(), format!("{}/", base_url));

        let artists = provider.search_groups("New York", 50).await.unwrap();

        assert_eq!(
            request.await.unwrap(),
            "GET /ws/2/artist/?query=area%3ANew+York+AND+type%3Agroup&fmt=json&limit=50 HTTP/1.1"
        );
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].name, "Glass Harbor");
        assert_eq!(artists[0].formation_year(), Some(2016));
    }

    #[tokio::test]
    async fn nominatim_reverse_request_shape() {
        let (base_url, request) = serve_once(r#"{"address":{"town":"Gresham"}}"#).await;
        let geocoder = NominatimGeocoder::new(client(), base_url);

        let address = geocoder
            .reverse(Coordinates {
                latitude: 45.52,
                longitude: -122.68,
            })
            .await
            .unwrap();

        assert_eq!(
            request.await.unwrap(),
            "GET /reverse?lat=45.52&lon=-122.68&format=json HTTP/1.1"
        );
        assert_eq!(address.place_name().as_deref(), Some("Gresham"));
    }

    #[tokio::test]
    async fn geojs_city_lookup() {
        let (base_url, request) =
            serve_once(r#"{"city":"Portland","country":"United States"}"#).await;
        let locator = GeoJsLocator::new(client(), format!("{}/v1/ip/geo.json", base_url));

        let city = locator.locate_city().await.unwrap();

        assert_eq!(request.await.unwrap(), "GET /v1/ip/geo.json HTTP/1.1");
        assert_eq!(city.as_deref(), Some("Portland"));
    }

    #[tokio::test]
    async fn geojs_blank_city_is_none() {
        let (base_url, request) = serve_once(r#"{"city":"  "}"#).await;
        let locator = GeoJsLocator::new(client(), base_url);

        assert_eq!(locator.locate_city().await.unwrap(), None);
        request.await.unwrap();
    }
}
