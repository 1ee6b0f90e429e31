//! HTTP client for the campaign analytics API

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::errors::ApiError;
use crate::config::Config;
use crate::models::{
    Campaign, CampaignDetail, CampaignPage, Credentials, HealthStatus, ListQuery, NewCampaign,
    TokenResponse,
};

/// Operations offered by the campaign service.
///
/// Every call that takes a `token` attaches it as a bearer credential when
/// present and goes out unauthenticated otherwise; rejecting anonymous calls
/// is the service's job.
#[async_trait]
pub trait CampaignApi: Send + Sync {
    /// Exchange username and password for a bearer token
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError>;

    /// Fetch one page of campaigns matching the query's filter
    async fn list_campaigns(
        &self,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<CampaignPage, ApiError>;

    /// Fetch a campaign with its periods and sites
    async fn get_campaign_detail(
        &self,
        token: Option<&str>,
        name: &str,
    ) -> Result<CampaignDetail, ApiError>;

    /// Campaigns running at any point between `start` and `end`
    async fn search_campaigns_by_date(
        &self,
        token: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Campaign>, ApiError>;

    /// Create a campaign together with its sites and periods
    async fn create_campaign(
        &self,
        token: Option<&str>,
        campaign: &NewCampaign,
    ) -> Result<Campaign, ApiError>;

    async fn health(&self) -> Result<HealthStatus, ApiError>;
}

/// Rejects inverted search ranges before they reach the service
pub fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if start > end {
        return Err(ApiError::InvalidRequest(format!(
            "Start date {} must be before end date {}",
            start, end
        )));
    }
    Ok(())
}

/// FastAPI error body. `detail` is a string for handled errors and a list of
/// objects for request validation failures.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

/// reqwest-backed implementation of [`CampaignApi`]
#[derive(Debug, Clone)]
pub struct HttpCampaignClient {
    client: Client,
    base_url: Url,
}

impl HttpCampaignClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(config.http.user_agent.clone())
            .timeout(config.http_timeout())
            .build()?;

        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            ApiError::InvalidRequest(format!("Invalid API URL '{}': {}", config.api_base_url, e))
        })?;

        Ok(Self { client, base_url })
    }

    /// Append path segments to the base URL. Segments are percent-encoded, so
    /// campaign names with spaces or slashes stay a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidRequest(format!("API URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, ApiError> {
        match request.send().await {
            Ok(response) => {
                debug!("Received {} from {}", response.status(), url);
                Ok(response)
            }
            Err(e) if e.is_timeout() => {
                warn!("Request to {} timed out", url);
                Err(ApiError::Timeout(url.to_string()))
            }
            Err(e) => {
                warn!("Request to {} failed: {}", url, e);
                Err(ApiError::Transport(e))
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            endpoint: url.path().to_string(),
            source,
        })
    }

    /// Turn a non-2xx response into an [`ApiError`]. `subject` is the campaign
    /// the request was about, if any.
    async fn error_from(response: Response, subject: Option<&str>) -> ApiError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        classify_status(status, &detail_message(&text), subject)
    }
}

/// Extract a readable message from an error body
fn detail_message(text: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(text) {
        Ok(ErrorResponse {
            detail: serde_json::Value::String(message),
        }) => message,
        Ok(ErrorResponse { detail }) => detail.to_string(),
        Err(_) if text.trim().is_empty() => "no response body".to_string(),
        Err(_) => text.trim().to_string(),
    }
}

fn classify_status(status: StatusCode, message: &str, subject: Option<&str>) -> ApiError {
    match (status, subject) {
        (StatusCode::UNAUTHORIZED, _) | (StatusCode::FORBIDDEN, _) => {
            ApiError::Unauthorized(message.to_string())
        }
        (StatusCode::NOT_FOUND, Some(name)) => ApiError::NotFound(name.to_string()),
        (StatusCode::CONFLICT, Some(name)) => ApiError::Conflict(name.to_string()),
        // The service reports duplicate names as a plain 400
        (StatusCode::BAD_REQUEST, Some(name)) if message.contains("already exists") => {
            ApiError::Conflict(name.to_string())
        }
        (StatusCode::BAD_REQUEST, _) | (StatusCode::UNPROCESSABLE_ENTITY, _) => {
            ApiError::InvalidRequest(message.to_string())
        }
        _ => ApiError::Status {
            status_code: status.as_u16(),
            message: message.to_string(),
        },
    }
}

#[async_trait]
impl CampaignApi for HttpCampaignClient {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let url = self.endpoint(&["token"])?;
        debug!("POST {} as {}", url, credentials.username);

        let request = self.client.post(url.clone()).form(credentials);
        let response = self.send(request, &url).await?;

        match response.status() {
            status if status.is_success() => {
                info!("Logged in as {}", credentials.username);
                Self::decode(response, &url).await
            }
            StatusCode::UNAUTHORIZED => Err(ApiError::InvalidCredentials),
            _ => Err(Self::error_from(response, None).await),
        }
    }

    async fn list_campaigns(
        &self,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<CampaignPage, ApiError> {
        let url = self.endpoint(&["campaigns", ""])?;
        let params = query.query_params();
        debug!("GET {} {:?}", url, params);

        let request = Self::authorize(self.client.get(url.clone()).query(&params), token);
        let response = self.send(request, &url).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, None).await);
        }
        Self::decode(response, &url).await
    }

    async fn get_campaign_detail(
        &self,
        token: Option<&str>,
        name: &str,
    ) -> Result<CampaignDetail, ApiError> {
        let url = self.endpoint(&["campaigns", name])?;
        debug!("GET {}", url);

        let request = Self::authorize(self.client.get(url.clone()), token);
        let response = self.send(request, &url).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, Some(name)).await);
        }
        Self::decode(response, &url).await
    }

    async fn search_campaigns_by_date(
        &self,
        token: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Campaign>, ApiError> {
        check_date_range(start, end)?;

        let url = self.endpoint(&["campaigns", "search-by-date"])?;
        let params = [
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ];
        debug!("GET {} {:?}", url, params);

        let request = Self::authorize(self.client.get(url.clone()).query(&params), token);
        let response = self.send(request, &url).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, None).await);
        }
        Self::decode(response, &url).await
    }

    async fn create_campaign(
        &self,
        token: Option<&str>,
        campaign: &NewCampaign,
    ) -> Result<Campaign, ApiError> {
        let name = campaign.campaign.name.as_str();
        let url = self.endpoint(&["campaigns"])?;
        debug!(
            "POST {} for {} ({} sites, {} periods)",
            url,
            name,
            campaign.sites.len(),
            campaign.periods.len()
        );

        let request = Self::authorize(self.client.post(url.clone()).json(campaign), token);
        let response = self.send(request, &url).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, Some(name)).await);
        }
        info!("Created campaign {}", name);
        Self::decode(response, &url).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint(&["health"])?;
        let response = self.send(self.client.get(url.clone()), &url).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, None).await);
        }
        Self::decode(response, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base: &str) -> HttpCampaignClient {
        let mut config = Config::from_env().unwrap();
        config.api_base_url = base.to_string();
        HttpCampaignClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_campaign_names() {
        let client = client_for("http://127.0.0.1:8000");
        let url = client.endpoint(&["campaigns", "verano 2025/b"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/campaigns/verano%202025%2Fb");
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_trailing_slash() {
        let client = client_for("http://localhost:8000/api/");
        let url = client.endpoint(&["campaigns", ""]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/campaigns/");
    }

    #[test]
    fn test_detail_message_variants() {
        assert_eq!(detail_message(r#"{"detail": "Campaign not found"}"#), "Campaign not found");
        assert!(detail_message(r#"{"detail": [{"loc": ["query", "limit"]}]}"#).contains("limit"));
        assert_eq!(detail_message(""), "no response body");
        assert_eq!(detail_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "Campaign not found", Some("x")),
            ApiError::NotFound(name) if name == "x"
        ));
        assert!(matches!(
            classify_status(
                StatusCode::BAD_REQUEST,
                "Campaign with this name already exists",
                Some("x")
            ),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::CONFLICT, "dup", Some("x")),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "Could not validate credentials", None),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "Not Found", None),
            ApiError::Status { status_code: 404, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom", Some("x")),
            ApiError::Status { status_code: 500, .. }
        ));
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert!(matches!(check_date_range(start, end), Err(ApiError::InvalidRequest(_))));
        assert!(check_date_range(end, start).is_ok());
        assert!(check_date_range(start, start).is_ok());
    }
}
