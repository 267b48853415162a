use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::models::{Question, StatisticsSummary};

const SEARCH_PATH: &str = "responses-binary/search";
const SEARCH_DATE_PATH: &str = "responses-binary/search/date";
const STATISTICS_PATH: &str = "responses-binary/statistics";
const STATISTICS_DATE_PATH: &str = "responses-binary/statistics/date";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("search backend unavailable: {0}")]
    Unavailable(String),
}

/// Remote responses/statistics backend
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search_by_filter(&self, activity: &str, phase: &str)
        -> Result<Vec<Question>, SearchError>;

    async fn search_by_filter_and_date(
        &self,
        activity: &str,
        phase: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Question>, SearchError>;

    async fn statistics_by_filter(
        &self,
        activity: &str,
        phase: &str,
    ) -> Result<StatisticsSummary, SearchError>;

    async fn statistics_by_filter_and_date(
        &self,
        activity: &str,
        phase: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<StatisticsSummary, SearchError>;
}

/// SearchService over the backend's JSON HTTP API
pub struct HttpSearchService {
    client: Client,
    base_url: String,
}

impl HttpSearchService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(SearchError::Unavailable("no backend URL configured".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SearchError::Client)?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SearchError> {
        let endpoint = self.endpoint(path);
        debug!(%endpoint, ?query, "querying search backend");

        let response = self
            .client
            .get(&endpoint)
            .query(query)
            .send()
            .await
            .map_err(|source| SearchError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| SearchError::Decode { endpoint, source })
    }
}

fn filter_query(activity: &str, phase: &str) -> Vec<(&'static str, String)> {
    vec![
        ("activity", activity.to_string()),
        ("phase", phase.to_string()),
    ]
}

fn dated_query(
    activity: &str,
    phase: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(&'static str, String)> {
    let mut query = filter_query(activity, phase);
    query.push(("startDate", start.format("%Y-%m-%d").to_string()));
    query.push(("endDate", end.format("%Y-%m-%d").to_string()));
    query
}

#[async_trait]
impl SearchService for HttpSearchService {
    async fn search_by_filter(
        &self,
        activity: &str,
        phase: &str,
    ) -> Result<Vec<Question>, SearchError> {
        self.fetch(SEARCH_PATH, &filter_query(activity, phase)).await
    }

    async fn search_by_filter_and_date(
        &self,
        activity: &str,
        phase: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Question>, SearchError> {
        self.fetch(SEARCH_DATE_PATH, &dated_query(activity, phase, start, end))
            .await
    }

    async fn statistics_by_filter(
        &self,
        activity: &str,
        phase: &str,
    ) -> Result<StatisticsSummary, SearchError> {
        self.fetch(STATISTICS_PATH, &filter_query(activity, phase)).await
    }

    async fn statistics_by_filter_and_date(
        &self,
        activity: &str,
        phase: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<StatisticsSummary, SearchError> {
        self.fetch(STATISTICS_DATE_PATH, &dated_query(activity, phase, start, end))
            .await
    }
}
