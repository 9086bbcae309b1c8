use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Devotional, Program};

const USER_AGENT: &str = concat!("daily-devotion/", env!("CARGO_PKG_VERSION"));

/// Read side of the devotional HTTP API.
#[async_trait]
pub trait DevotionalApi: Send + Sync {
    async fn fetch_programs(&self) -> Result<Vec<Program>>;
    async fn fetch_daily_studies(&self) -> Result<Vec<Devotional>>;
    /// `Ok(None)` when the API has no study for that date.
    async fn fetch_daily_study(&self, date: NaiveDate) -> Result<Option<Devotional>>;
}

pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl DevotionalApi for HttpApi {
    async fn fetch_programs(&self) -> Result<Vec<Program>> {
        let response = self.client.get(self.endpoint("programs")).send().await?;

        if !response.status().is_success() {
            return Err(AppError::ApiStatus(response.status()));
        }

        let programs: Vec<Program> = response.json().await?;
        tracing::debug!("Fetched {} programs", programs.len());
        Ok(programs)
    }

    async fn fetch_daily_studies(&self) -> Result<Vec<Devotional>> {
        let response = self.client.get(self.endpoint("daily-study")).send().await?;

        if !response.status().is_success() {
            return Err(AppError::ApiStatus(response.status()));
        }

        let studies: Vec<Devotional> = response.json().await?;
        tracing::debug!("Fetched {} daily studies", studies.len());
        Ok(studies)
    }

    async fn fetch_daily_study(&self, date: NaiveDate) -> Result<Option<Devotional>> {
        let path = format!("daily-study/{}", date.format("%Y-%m-%d"));
        let response = self.client.get(self.endpoint(&path)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::ApiStatus(response.status()));
        }

        Ok(Some(response.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(Url::parse(base).unwrap(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn endpoints_join_without_double_slashes() {
        assert_eq!(
            api("https://api.example.org/v1/").endpoint("programs"),
            "https://api.example.org/v1/programs"
        );
        assert_eq!(
            api("https://api.example.org/v1").endpoint("daily-study/2024-05-12"),
            "https://api.example.org/v1/daily-study/2024-05-12"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        // Bind then drop a listener to get a port nothing is listening on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let api = api(&format!("http://127.0.0.1:{port}"));
        let err = api.fetch_programs().await.unwrap_err();
        assert!(err.is_network());

        let date = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        assert!(api.fetch_daily_study(date).await.unwrap_err().is_network());
    }
}
