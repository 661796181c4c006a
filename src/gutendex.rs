use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::error::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://gutendex.com/books/";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<RawBook>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawBook {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<RawAuthor>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub download_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "year_text")]
    pub birth_year: Option<String>,
    #[serde(default, deserialize_with = "year_text")]
    pub death_year: Option<String>,
}

/// Gutendex sends years as integers, older mirrors as strings. Keep both as
/// text and leave the interpretation to the mapper.
fn year_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Year>::deserialize(deserializer)? {
        None => None,
        Some(Year::Int(value)) => Some(value.to_string()),
        Some(Year::Float(value)) => Some(value.to_string()),
        Some(Year::Text(value)) => Some(value),
    })
}

pub trait CatalogClient: Send + Sync {
    fn search(&self, title: &str) -> Result<Envelope, FetchError>;
    fn search_top_by_downloads(&self) -> Result<Envelope, FetchError>;
}

#[derive(Clone)]
pub struct GutendexHttpClient {
    client: Client,
    base_url: String,
}

impl GutendexHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gutenshelf/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FetchError::Unavailable(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|err| FetchError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn get(&self, query: &[(&str, &str)]) -> Result<Envelope, FetchError> {
        let request = self
            .client
            .get(&self.base_url)
            .query(query)
            .build()
            .map_err(|err| FetchError::Unavailable(err.to_string()))?;
        info!(url = %request.url(), "gutendex.request");

        let start = std::time::Instant::now();
        let response = self
            .client
            .execute(request)
            .map_err(|err| FetchError::Unavailable(err.to_string()))?;
        info!(
            status = response.status().as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "gutendex.response"
        );

        let response = Self::handle_status(response)?;
        response
            .json::<Envelope>()
            .map_err(|err| FetchError::Unavailable(format!("malformed response body: {err}")))
    }

    fn handle_status(response: Response) -> Result<Response, FetchError> {
        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("<none>");
            warn!(status = status.as_u16(), location, "gutendex.redirect");
        }
        check_status(status)?;
        Ok(response)
    }
}

impl CatalogClient for GutendexHttpClient {
    fn search(&self, title: &str) -> Result<Envelope, FetchError> {
        self.get(&[("search", title)])
    }

    fn search_top_by_downloads(&self) -> Result<Envelope, FetchError> {
        self.get(&[("sort", "download_count")])
    }
}

/// Redirects are an error of their own; every other non-2xx status means the
/// API is unavailable.
pub fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }
    if status.is_redirection() {
        return Err(FetchError::Redirect);
    }
    Err(FetchError::Unavailable(format!(
        "Gutendex returned status {}",
        status.as_u16()
    )))
}
