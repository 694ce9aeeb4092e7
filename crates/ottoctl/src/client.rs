//! HTTP client for the ottod API.

use anyhow::{anyhow, Result};
use otto_common::{
    Case, CaseSummary, FixAttempt, HealthResponse, NewCaseRequest, NewFollowUpRequest,
    RecordOutcomeRequest, ToggleStepRequest, ToggleStepResponse,
};

/// Client for talking to ottod.
pub struct OttodClient {
    base_url: String,
    http: reqwest::Client,
}

impl OttodClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(anyhow!("{}: {}", status, body))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(connect_hint)?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(connect_hint)?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_json("/v1/health").await
    }

    pub async fn submit_case(&self, request: &NewCaseRequest) -> Result<Case> {
        self.post_json("/v1/cases", request).await
    }

    pub async fn follow_up(&self, case_id: &str, request: &NewFollowUpRequest) -> Result<Case> {
        self.post_json(&format!("/v1/cases/{}/follow-up", case_id), request)
            .await
    }

    pub async fn get_case(&self, case_id: &str) -> Result<Case> {
        self.get_json(&format!("/v1/cases/{}", case_id)).await
    }

    pub async fn recent_cases(&self, limit: usize) -> Result<Vec<Case>> {
        self.get_json(&format!("/v1/cases/recent?limit={}", limit))
            .await
    }

    pub async fn fix_history(&self, case_id: &str) -> Result<Vec<FixAttempt>> {
        self.get_json(&format!("/v1/cases/{}/history", case_id))
            .await
    }

    pub async fn toggle_step(
        &self,
        case_id: &str,
        request: &ToggleStepRequest,
    ) -> Result<ToggleStepResponse> {
        self.post_json(&format!("/v1/cases/{}/steps", case_id), request)
            .await
    }

    pub async fn record_outcome(
        &self,
        case_id: &str,
        request: &RecordOutcomeRequest,
    ) -> Result<FixAttempt> {
        self.post_json(&format!("/v1/cases/{}/outcome", case_id), request)
            .await
    }

    pub async fn case_summary(&self, case_id: &str) -> Result<CaseSummary> {
        self.get_json(&format!("/v1/cases/{}/summary", case_id))
            .await
    }
}

fn connect_hint(err: reqwest::Error) -> anyhow::Error {
    if err.is_connect() {
        anyhow!(
            "Cannot connect to ottod: {}\n\n\
             Is the daemon running? Try: systemctl status ottod",
            err
        )
    } else {
        err.into()
    }
}
