//! In-process implementation of [`CampaignApi`].
//!
//! Mirrors the service's observable behaviour (offset pagination, type and
//! date filters, duplicate-name conflicts, bearer checks on create) so the
//! session, listing and TUI layers can be exercised without a server.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::client::{check_date_range, CampaignApi};
use super::errors::ApiError;
use crate::models::{
    Campaign, CampaignDetail, CampaignPage, CampaignPeriod, CampaignSite, Credentials,
    HealthStatus, ListQuery, NewCampaign, TokenResponse,
};

#[derive(Default)]
struct State {
    campaigns: Vec<CampaignDetail>,
    users: HashMap<String, String>,
    tokens: HashSet<String>,
    next_id: i64,
    issued: u64,
}

#[derive(Default)]
pub struct InMemoryCampaignApi {
    state: Mutex<State>,
}

impl InMemoryCampaignApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.lock()
            .users
            .insert(username.to_string(), password.to_string());
        self
    }

    pub fn with_campaigns(self, campaigns: impl IntoIterator<Item = Campaign>) -> Self {
        {
            let mut state = self.lock();
            for campaign in campaigns {
                state.campaigns.push(CampaignDetail {
                    campaign,
                    periods: Vec::new(),
                    sites: Vec::new(),
                });
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.lock().campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl State {
    /// A presented token must be one we issued; an absent token is anonymous.
    fn check_token(&self, token: Option<&str>) -> Result<(), ApiError> {
        match token {
            Some(token) if !self.tokens.contains(token) => Err(ApiError::Unauthorized(
                "Could not validate credentials".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn matches(campaign: &Campaign, query: &ListQuery) -> bool {
        let filter = &query.filter;
        if let Some(ref campaign_type) = filter.campaign_type {
            if &campaign.campaign_type != campaign_type {
                return false;
            }
        }
        if let Some(start) = filter.start_date {
            if campaign.end_date < start {
                return false;
            }
        }
        if let Some(end) = filter.end_date {
            if campaign.start_date > end {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl CampaignApi for InMemoryCampaignApi {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let mut state = self.lock();
        match state.users.get(&credentials.username) {
            Some(password) if *password == credentials.password => {
                state.issued += 1;
                let token = format!("token-{}-{}", credentials.username, state.issued);
                state.tokens.insert(token.clone());
                Ok(TokenResponse {
                    access_token: token,
                    token_type: "bearer".to_string(),
                })
            }
            _ => Err(ApiError::InvalidCredentials),
        }
    }

    async fn list_campaigns(
        &self,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<CampaignPage, ApiError> {
        let state = self.lock();
        state.check_token(token)?;

        let matching: Vec<&Campaign> = state
            .campaigns
            .iter()
            .map(|detail| &detail.campaign)
            .filter(|campaign| State::matches(campaign, query))
            .collect();

        Ok(CampaignPage {
            total: matching.len(),
            records: matching
                .into_iter()
                .skip(query.offset())
                .take(query.page_size)
                .cloned()
                .collect(),
        })
    }

    async fn get_campaign_detail(
        &self,
        token: Option<&str>,
        name: &str,
    ) -> Result<CampaignDetail, ApiError> {
        let state = self.lock();
        state.check_token(token)?;

        state
            .campaigns
            .iter()
            .find(|detail| detail.campaign.name == name)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(name.to_string()))
    }

    async fn search_campaigns_by_date(
        &self,
        token: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Campaign>, ApiError> {
        check_date_range(start, end)?;
        let state = self.lock();
        state.check_token(token)?;

        Ok(state
            .campaigns
            .iter()
            .map(|detail| &detail.campaign)
            .filter(|campaign| campaign.start_date <= end && campaign.end_date >= start)
            .cloned()
            .collect())
    }

    async fn create_campaign(
        &self,
        token: Option<&str>,
        campaign: &NewCampaign,
    ) -> Result<Campaign, ApiError> {
        let mut state = self.lock();
        if token.is_none() {
            return Err(ApiError::Unauthorized("Not authenticated".to_string()));
        }
        state.check_token(token)?;

        let name = campaign.campaign.name.clone();
        if state.campaigns.iter().any(|detail| detail.campaign.name == name) {
            return Err(ApiError::Conflict(name));
        }

        let mut periods = Vec::with_capacity(campaign.periods.len());
        for record in &campaign.periods {
            state.next_id += 1;
            periods.push(CampaignPeriod {
                id: state.next_id,
                campaign_name: name.clone(),
                record: record.clone(),
            });
        }
        let mut sites = Vec::with_capacity(campaign.sites.len());
        for record in &campaign.sites {
            state.next_id += 1;
            sites.push(CampaignSite {
                id: state.next_id,
                campaign_name: name.clone(),
                record: record.clone(),
            });
        }

        state.campaigns.push(CampaignDetail {
            campaign: campaign.campaign.clone(),
            periods,
            sites,
        });
        Ok(campaign.campaign.clone())
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus {
            status: "ok".to_string(),
        })
    }
}
