//! Place lookup against the Goong maps API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::database::{Coordinates, PlaceRecord};

/// Finds a real place for a free-text query near the user.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Best match for `query` within range of `origin`, or `None`.
    async fn find_nearby_or_by_name(&self, query: &str, origin: Coordinates) -> Option<PlaceRecord>;
}

#[derive(Debug, Deserialize)]
struct AutoCompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    status: String,
    result: Option<PlaceDetail>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetail {
    name: String,
    #[serde(default)]
    formatted_address: String,
    geometry: Geometry,
    #[serde(default)]
    opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Goong AutoComplete + Detail client with a strict distance check.
#[derive(Debug, Clone)]
pub struct GoongPlaces {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    radius_km: f64,
}

impl GoongPlaces {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        radius_km: f64,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
            radius_km,
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, url::ParseError> {
        let base = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        Url::parse_with_params(&base, params)
    }

    async fn lookup(
        &self,
        api_key: &str,
        query: &str,
        origin: Coordinates,
    ) -> anyhow::Result<Option<PlaceRecord>> {
        let location = format!("{},{}", origin.lat, origin.lng);
        let radius = self.radius_km.to_string();
        let search = self.url(
            "Place/AutoComplete",
            &[
                ("api_key", api_key),
                ("input", query),
                ("location", &location),
                ("radius", &radius),
            ],
        )?;

        let found: AutoCompleteResponse = self.http.get(search).send().await?.json().await?;
        let Some(best) = found.predictions.into_iter().next().filter(|_| found.status == "OK") else {
            debug!("No place found for '{}'", query);
            return Ok(None);
        };

        let detail_url = self.url(
            "Place/Detail",
            &[("api_key", api_key), ("place_id", &best.place_id)],
        )?;
        let detail: DetailResponse = self.http.get(detail_url).send().await?.json().await?;
        let Some(place) = detail.result.filter(|_| detail.status == "OK") else {
            debug!("No details for place {}", best.place_id);
            return Ok(None);
        };

        let position = Coordinates::new(place.geometry.location.lat, place.geometry.location.lng);
        let distance_km = origin.distance_km(&position);
        if distance_km > self.radius_km {
            debug!(
                "'{}' is {:.2}km away (limit {}km), ignoring",
                place.name, distance_km, self.radius_km
            );
            return Ok(None);
        }

        Ok(Some(PlaceRecord {
            place_id: best.place_id,
            name: place.name,
            address: place.formatted_address,
            lat: position.lat,
            lng: position.lng,
            distance_km,
            open_now: place.opening_hours.and_then(|hours| hours.open_now),
        }))
    }
}

#[async_trait]
impl PlaceLookup for GoongPlaces {
    async fn find_nearby_or_by_name(&self, query: &str, origin: Coordinates) -> Option<PlaceRecord> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("GOONG_API_KEY not set, skipping place lookup for '{}'", query);
            return None;
        };

        match self.lookup(api_key, query, origin).await {
            Ok(place) => place,
            Err(e) => {
                warn!("Place lookup for '{}' failed: {}", query, e);
                None
            }
        }
    }
}
