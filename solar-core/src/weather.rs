//! Daily weather lookups used to enrich the readings table.
//!
//! The toolkit talks to the Visual Crossing timeline API, one request per
//! date. A failed lookup is never fatal: the caller leaves the row without
//! weather and a later run may try again.

use crate::error::{Result, SolarError};
use crate::reading::Weather;
use chrono::NaiveDate;
use serde::Deserialize;

#[cfg(feature = "api")]
use log::{info, warn};
#[cfg(feature = "api")]
use reqwest::{Client, StatusCode, Url};
#[cfg(feature = "api")]
use solar_utils::dates::format_date;
use std::time::Duration;

/// Base of the Visual Crossing timeline endpoint.
pub const TIMELINE_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

/// Default location for lookups when none is configured.
pub const DEFAULT_LOCATION: &str = "CO5 8TA, UK";

/// Pauses between attempts when a lookup is tried up to `max_tries`
/// times: one fewer than the attempts, starting at `initial` and doubling.
pub fn backoff_delays(initial: Duration, max_tries: u32) -> Vec<Duration> {
    let mut delay = initial;
    (1..max_tries)
        .map(|_| {
            let current = delay;
            delay = delay.saturating_mul(2);
            current
        })
        .collect()
}

/// Anything that can produce the weather for a single day.
#[allow(async_fn_in_trait)]
pub trait WeatherSource {
    async fn fetch_day(&self, date: NaiveDate) -> Result<Weather>;
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    days: Vec<TimelineDay>,
}

#[derive(Debug, Deserialize)]
struct TimelineDay {
    tempmax: Option<f64>,
    tempmin: Option<f64>,
    cloudcover: Option<f64>,
    #[serde(rename = "sunHours")]
    sun_hours: Option<f64>,
    conditions: Option<String>,
}

/// Parse a timeline API body into the weather for its first day.
pub fn parse_timeline_response(body: &str, date: &NaiveDate) -> Result<Weather> {
    let response: TimelineResponse =
        serde_json::from_str(body).map_err(|e| SolarError::ResponseParse(e.to_string()))?;
    let day = response
        .days
        .into_iter()
        .next()
        .ok_or_else(|| SolarError::ResponseParse(format!("no days in response for {date}")))?;
    Ok(Weather {
        temp_max_c: day.tempmax,
        temp_min_c: day.tempmin,
        cloud_cover_percent: day.cloudcover,
        sun_hours: day.sun_hours,
        condition: day.conditions.filter(|c| !c.trim().is_empty()),
    }
    .sanitized(date))
}

/// Visual Crossing client with bounded retry and exponential backoff.
#[cfg(feature = "api")]
#[derive(Debug, Clone)]
pub struct VisualCrossingClient {
    client: Client,
    api_key: String,
    location: String,
    max_tries: u32,
    initial_backoff: Duration,
}

#[cfg(feature = "api")]
impl VisualCrossingClient {
    pub fn new(api_key: &str, location: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(VisualCrossingClient {
            client,
            api_key: api_key.to_string(),
            location: location.to_string(),
            max_tries: 3,
            initial_backoff: Duration::from_millis(1000),
        })
    }

    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries.max(1);
        self
    }

    /// Build the request URL. The location is a path segment and is
    /// percent-encoded ("CO5 8TA, UK" contains spaces and a comma).
    pub fn day_url(&self, date: &NaiveDate) -> Result<Url> {
        let mut url = Url::parse(TIMELINE_BASE_URL)
            .map_err(|e| SolarError::ResponseParse(format!("bad base url: {e}")))?;
        let day = format_date(date);
        url.path_segments_mut()
            .map_err(|_| SolarError::ResponseParse("base url cannot hold a path".to_string()))?
            .push(&self.location)
            .push(&day)
            .push(&day);
        url.query_pairs_mut()
            .append_pair("unitGroup", "metric")
            .append_pair("key", &self.api_key)
            .append_pair("include", "days");
        Ok(url)
    }

    async fn try_once(&self, url: &Url, date: &NaiveDate) -> Result<Weather> {
        let response = self.client.get(url.clone()).send().await?;
        if response.status() != StatusCode::OK {
            return Err(SolarError::ResponseParse(format!(
                "bad response status {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        parse_timeline_response(&body, date)
    }
}

#[cfg(feature = "api")]
impl WeatherSource for VisualCrossingClient {
    async fn fetch_day(&self, date: NaiveDate) -> Result<Weather> {
        let url = self.day_url(&date)?;
        let mut delays = backoff_delays(self.initial_backoff, self.max_tries).into_iter();
        let mut attempt = 1;
        loop {
            match self.try_once(&url, &date).await {
                Ok(weather) => return Ok(weather),
                Err(e) => match delays.next() {
                    None => {
                        warn!("All {} attempts failed for {}: {}", self.max_tries, date, e);
                        return Err(e);
                    }
                    Some(delay) => {
                        warn!(
                            "Attempt {}/{}: weather lookup for {} failed: {}",
                            attempt, self.max_tries, date, e
                        );
                        info!(
                            "Sleeping for {} milliseconds before retry for {}",
                            delay.as_millis(),
                            date
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                },
            }
        }
    }
}
