use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Campaign cadence as stored by the service (`tipo_campania`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CampaignType {
    Monthly,
    Biweekly,
    Other(String),
}

impl CampaignType {
    /// Every type the service knows about, in the order the filter offers them
    pub const KNOWN: [CampaignType; 2] = [CampaignType::Monthly, CampaignType::Biweekly];

    /// Wire value
    pub fn as_str(&self) -> &str {
        match self {
            CampaignType::Monthly => "mensual",
            CampaignType::Biweekly => "catorcenal",
            CampaignType::Other(s) => s,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CampaignType::Monthly => "Monthly",
            CampaignType::Biweekly => "Biweekly",
            CampaignType::Other(s) => s,
        }
    }
}

impl From<String> for CampaignType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "mensual" | "monthly" => CampaignType::Monthly,
            "catorcenal" | "biweekly" => CampaignType::Biweekly,
            _ => CampaignType::Other(value),
        }
    }
}

impl From<CampaignType> for String {
    fn from(value: CampaignType) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for CampaignType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CampaignType::from(s.to_string()))
    }
}

impl fmt::Display for CampaignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The service sends `null` for metrics it does not have; those read as zero.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Aggregate delivery metrics of a campaign
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    #[serde(rename = "universo_zona_metro", default, deserialize_with = "null_as_default")]
    pub metro_universe: i64,
    #[serde(rename = "impactos_personas", default, deserialize_with = "null_as_default")]
    pub people_impacts: i64,
    #[serde(rename = "impactos_vehiculos", default, deserialize_with = "null_as_default")]
    pub vehicle_impacts: i64,
    #[serde(rename = "frecuencia_calculada", default, deserialize_with = "null_as_default")]
    pub calculated_frequency: f64,
    #[serde(rename = "frecuencia_promedio", default, deserialize_with = "null_as_default")]
    pub average_frequency: f64,
    #[serde(rename = "alcance", default, deserialize_with = "null_as_default")]
    pub reach: i64,
}

/// Audience breakdown. Every value is a fraction of the audience; nothing
/// forces a bracket family to sum to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nse_ab: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nse_c: f64,
    #[serde(rename = "nse_cmas", default, deserialize_with = "null_as_default")]
    pub nse_c_plus: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nse_d: f64,
    #[serde(rename = "nse_dmas", default, deserialize_with = "null_as_default")]
    pub nse_d_plus: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nse_e: f64,
    #[serde(rename = "edad_0a14", default, deserialize_with = "null_as_default")]
    pub age_0_14: f64,
    #[serde(rename = "edad_15a19", default, deserialize_with = "null_as_default")]
    pub age_15_19: f64,
    #[serde(rename = "edad_20a24", default, deserialize_with = "null_as_default")]
    pub age_20_24: f64,
    #[serde(rename = "edad_25a34", default, deserialize_with = "null_as_default")]
    pub age_25_34: f64,
    #[serde(rename = "edad_35a44", default, deserialize_with = "null_as_default")]
    pub age_35_44: f64,
    #[serde(rename = "edad_45a64", default, deserialize_with = "null_as_default")]
    pub age_45_64: f64,
    #[serde(rename = "edad_65mas", default, deserialize_with = "null_as_default")]
    pub age_65_plus: f64,
    #[serde(rename = "hombres", default, deserialize_with = "null_as_default")]
    pub men: f64,
    #[serde(rename = "mujeres", default, deserialize_with = "null_as_default")]
    pub women: f64,
}

/// A campaign as listed by the service. `name` is the primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    #[serde(rename = "tipo_campania")]
    pub campaign_type: CampaignType,
    #[serde(rename = "fecha_inicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "fecha_fin")]
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub metrics: CampaignMetrics,
    #[serde(flatten)]
    pub demographics: Demographics,
}

impl Campaign {
    pub fn new(name: &str, campaign_type: CampaignType, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            campaign_type,
            start_date,
            end_date,
            metrics: CampaignMetrics::default(),
            demographics: Demographics::default(),
        }
    }
}

/// Performance of one time bucket (month, fortnight) of a campaign
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period: String,
    #[serde(rename = "impactos_periodo_personas", default, deserialize_with = "null_as_default")]
    pub people_impacts: i64,
    #[serde(rename = "impactos_periodo_vehiculos", default, deserialize_with = "null_as_default")]
    pub vehicle_impacts: i64,
}

/// One physical placement of a campaign
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    #[serde(rename = "codigo_del_sitio")]
    pub code: String,
    #[serde(rename = "tipo_de_mueble", default, deserialize_with = "null_as_default")]
    pub furniture_type: String,
    #[serde(rename = "tipo_de_anuncio", default, deserialize_with = "null_as_default")]
    pub ad_type: String,
    #[serde(rename = "estado", default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(rename = "municipio", default, deserialize_with = "null_as_default")]
    pub municipality: String,
    #[serde(rename = "zm", default, deserialize_with = "null_as_default")]
    pub metro_zone: String,
    #[serde(rename = "frecuencia_catorcenal", default, deserialize_with = "null_as_default")]
    pub biweekly_frequency: f64,
    #[serde(rename = "frecuencia_mensual", default, deserialize_with = "null_as_default")]
    pub monthly_frequency: f64,
    #[serde(rename = "impactos_catorcenal", default, deserialize_with = "null_as_default")]
    pub biweekly_impacts: i64,
    #[serde(rename = "impactos_mensuales", default, deserialize_with = "null_as_default")]
    pub monthly_impacts: i64,
    #[serde(rename = "alcance_mensual", default, deserialize_with = "null_as_default")]
    pub monthly_reach: f64,
}

/// Stored period, owned by the campaign named in `campaign_name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPeriod {
    pub id: i64,
    pub campaign_name: String,
    #[serde(flatten)]
    pub record: PeriodRecord,
}

/// Stored site, owned by the campaign named in `campaign_name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSite {
    pub id: i64,
    pub campaign_name: String,
    #[serde(flatten)]
    pub record: SiteRecord,
}

/// Campaign with its nested periods and sites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    #[serde(default)]
    pub periods: Vec<CampaignPeriod>,
    #[serde(default)]
    pub sites: Vec<CampaignSite>,
}

/// Body of `POST /campaigns`: the campaign plus sub-lists created with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCampaign {
    #[serde(flatten)]
    pub campaign: Campaign,
    #[serde(default)]
    pub sites: Vec<SiteRecord>,
    #[serde(default)]
    pub periods: Vec<PeriodRecord>,
}

/// One page of `GET /campaigns/`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CampaignPage {
    #[serde(rename = "data")]
    pub records: Vec<Campaign>,
    pub total: usize,
}

/// OAuth2 password-grant form body
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Filter tuple of the campaign list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignFilter {
    pub campaign_type: Option<CampaignType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl CampaignFilter {
    pub fn is_active(&self) -> bool {
        self.campaign_type.is_some() || self.start_date.is_some() || self.end_date.is_some()
    }
}

/// Zero-based page request for `GET /campaigns/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: usize,
    pub page_size: usize,
    pub filter: CampaignFilter,
}

impl ListQuery {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size,
            filter: CampaignFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: CampaignFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Number of records the service skips
    pub fn offset(&self) -> usize {
        self.page * self.page_size
    }

    /// Query string pairs; filters that are not set are left out entirely.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("skip", self.offset().to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(ref campaign_type) = self.filter.campaign_type {
            params.push(("tipo_campania", campaign_type.as_str().to_string()));
        }
        if let Some(start) = self.filter.start_date {
            params.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.filter.end_date {
            params.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        params
    }
}
