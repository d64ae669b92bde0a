// services/betsapi_client.rs
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::betsapi::{BetsApiListResponse, BetsApiMatch, MatchType};

/// Read access to the upstream provider.
#[async_trait]
pub trait BetsApiProvider: Send + Sync {
    /// `Ok(None)` when the provider has no event with this id.
    async fn get_match_details(&self, event_id: &str) -> Result<Option<BetsApiMatch>>;

    async fn list_matches(
        &self,
        match_type: MatchType,
        page: u32,
        day: Option<&str>,
    ) -> Result<BetsApiListResponse>;
}

#[derive(Debug, Clone)]
pub struct BetsApiClient {
    client: Client,
    base_url: String,
    token: String,
    sport_id: String,
}

impl BetsApiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.betsapi_timeout_secs))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(BetsApiClient {
            client,
            base_url: config.betsapi_base_url.clone(),
            token: config.betsapi_token.clone(),
            sport_id: config.betsapi_sport_id.clone(),
        })
    }

    fn list_path(match_type: MatchType) -> &'static str {
        match match_type {
            MatchType::Upcoming => "v3/events/upcoming",
            MatchType::Inplay => "v3/events/inplay",
            MatchType::Ended => "v3/events/ended",
        }
    }

    fn list_params(&self, match_type: MatchType, page: u32, day: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("token", self.token.clone()),
            ("sport_id", self.sport_id.clone()),
        ];
        if match_type.is_paginated() {
            params.push(("page", page.to_string()));
            if let Some(day) = day {
                params.push(("day", day.to_string()));
            }
        }
        params
    }

    async fn get(&self, path: &str, params: &[(&'static str, String)]) -> Result<BetsApiListResponse> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("BetsAPI GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::external_api(format!("BetsAPI request to {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("BetsAPI {} returned {} - {}", path, status, body);
            return Err(AppError::external_api(format!("BetsAPI {} returned {}", path, status)));
        }

        let payload: BetsApiListResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_api(format!("Invalid BetsAPI response from {}: {}", path, e)))?;

        if !payload.is_success() {
            let reason = payload.error.clone().unwrap_or_else(|| "unknown error".to_string());
            return Err(AppError::external_api(format!("BetsAPI {} failed: {}", path, reason)));
        }

        Ok(payload)
    }
}

#[async_trait]
impl BetsApiProvider for BetsApiClient {
    async fn get_match_details(&self, event_id: &str) -> Result<Option<BetsApiMatch>> {
        let params = [("token", self.token.clone()), ("event_id", event_id.to_string())];
        let payload = self.get("v1/event/view", &params).await?;
        Ok(payload.results.into_iter().next())
    }

    async fn list_matches(
        &self,
        match_type: MatchType,
        page: u32,
        day: Option<&str>,
    ) -> Result<BetsApiListResponse> {
        let params = self.list_params(match_type, page, day);
        let payload = self.get(Self::list_path(match_type), &params).await?;

        info!(
            "BetsAPI {} page {} (day: {:?}) -> {} events",
            match_type,
            page,
            day,
            payload.results.len()
        );
        Ok(payload)
    }
}
