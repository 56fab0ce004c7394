use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::client::build_http_client;
use crate::config::WeatherConfig;
use crate::errors::{ConfigResult, ProviderError, ProviderResult};
use crate::types::WeatherReport;

/// Current-conditions lookup. `Ok(None)` when the place is unknown.
#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn lookup(&self, place: &str) -> ProviderResult<Option<WeatherReport>>;
}

#[derive(Deserialize, Debug)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Deserialize, Debug)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize, Debug)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Deserialize, Debug)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
}

/// Open-Meteo binding: geocode the place, then read `current_weather`
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http_client: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> ConfigResult<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            geocoding_url: config.geocoding_url.trim_end_matches('/').to_string(),
            forecast_url: config.forecast_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T>(&self, url: String, query: &[(&str, String)]) -> ProviderResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.http_client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Parsing(format!("Failed to parse Open-Meteo response: {}", e.without_url())))
    }
}

#[async_trait]
impl WeatherClient for OpenMeteoClient {
    async fn lookup(&self, place: &str) -> ProviderResult<Option<WeatherReport>> {
        debug!(place, "Geocoding place for weather lookup");

        let geocoded: GeocodingResponse = self
            .get_json(
                format!("{}/v1/search", self.geocoding_url),
                &[
                    ("name", place.to_string()),
                    ("count", "1".to_string()),
                    ("language", "en".to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        let Some(location) = geocoded.results.into_iter().next() else {
            return Ok(None);
        };

        let forecast: ForecastResponse = self
            .get_json(
                format!("{}/v1/forecast", self.forecast_url),
                &[
                    ("latitude", location.latitude.to_string()),
                    ("longitude", location.longitude.to_string()),
                    ("current_weather", "true".to_string()),
                ],
            )
            .await?;

        Ok(forecast.current_weather.map(|current| WeatherReport {
            place: location.name,
            temperature: current.temperature,
            windspeed: current.windspeed,
        }))
    }
}
