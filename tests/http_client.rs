use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::NaiveDate;
use tokio::net::TcpListener;

use campaign_dash::api::{ApiError, CampaignApi, HttpCampaignClient};
use campaign_dash::config::{Config, HttpConfig, ListingConfig};
use campaign_dash::models::{
    Campaign, CampaignFilter, CampaignType, Credentials, ListQuery, NewCampaign,
};

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: String,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn target(&self) -> &str {
        &self.target
    }
}

/// Canned replies handed out in order, and every request the server saw
#[derive(Clone, Default)]
struct Fixture {
    replies: Arc<Mutex<VecDeque<(StatusCode, &'static str)>>>,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

async fn record(
    State(fixture): State<Fixture>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    fixture.recorded.lock().unwrap().push(Recorded {
        method,
        target: uri.to_string(),
        headers,
        body,
    });
    let (status, body) = fixture
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail": "no reply left"}"#));
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serve the `(status, body)` replies in order and record each request
async fn serve(replies: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let fixture = Fixture::default();
    fixture.replies.lock().unwrap().extend(
        replies
            .into_iter()
            .map(|(status, body)| (StatusCode::from_u16(status).unwrap(), body)),
    );
    let recorded = fixture.recorded.clone();

    let app = Router::new().fallback(record).with_state(fixture);
    (spawn(app).await, recorded)
}

fn client_with_timeout(base_url: &str, timeout_seconds: u64) -> HttpCampaignClient {
    let config = Config {
        api_base_url: base_url.to_string(),
        token_path: "./.campaign_dash_token".into(),
        export_dir: "./reports".into(),
        listing: ListingConfig::default(),
        http: HttpConfig {
            timeout_seconds,
            ..HttpConfig::default()
        },
    };
    HttpCampaignClient::new(&config).unwrap()
}

fn client(base_url: &str) -> HttpCampaignClient {
    client_with_timeout(base_url, HttpConfig::default().timeout_seconds)
}

const PAGE: &str = r#"{
    "data": [
        {"name": "verano", "tipo_campania": "mensual", "fecha_inicio": "2025-06-01",
         "fecha_fin": "2025-08-31", "impactos_personas": 120000, "alcance": null},
        {"name": "otoño", "tipo_campania": "catorcenal", "fecha_inicio": "2025-09-01",
         "fecha_fin": "2025-11-30"}
    ],
    "total": 8
}"#;

#[tokio::test]
async fn list_sends_bearer_and_paging_only() {
    let (url, recorded) = serve(vec![(200, PAGE)]).await;
    let api = client(&url);

    let page = api
        .list_campaigns(Some("tok-123"), &ListQuery::new(1, 5))
        .await
        .unwrap();

    assert_eq!(page.total, 8);
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].metrics.people_impacts, 120000);
    assert_eq!(page.records[0].metrics.reach, 0);
    assert_eq!(page.records[1].campaign_type, CampaignType::Biweekly);

    let requests = recorded.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.target(), "/campaigns/?skip=5&limit=5");
    assert_eq!(request.header("authorization"), Some("Bearer tok-123"));
}

#[tokio::test]
async fn list_sends_active_filters() {
    let (url, recorded) = serve(vec![(200, r#"{"data": [], "total": 0}"#)]).await;
    let api = client(&url);

    let query = ListQuery::new(0, 5).with_filter(CampaignFilter {
        campaign_type: Some(CampaignType::Monthly),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        end_date: None,
    });
    let page = api.list_campaigns(None, &query).await.unwrap();
    assert!(page.records.is_empty());

    let requests = recorded.lock().unwrap();
    let target = requests[0].target();
    assert!(target.contains("tipo_campania=mensual"));
    assert!(target.contains("start_date=2025-01-01"));
    assert!(!target.contains("end_date"));
    assert_eq!(requests[0].header("authorization"), None);
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let (url, _) = serve(vec![(401, r#"{"detail": "Could not validate credentials"}"#)]).await;
    let api = client(&url);

    let err = api
        .list_campaigns(Some("stale"), &ListQuery::new(0, 5))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Not authorized: Could not validate credentials");
}

#[tokio::test]
async fn login_posts_form_and_maps_401() {
    let (url, recorded) = serve(vec![
        (200, r#"{"access_token": "abc", "token_type": "bearer"}"#),
        (401, r#"{"detail": "Incorrect username or password"}"#),
    ])
    .await;
    let api = client(&url);

    let token = api.login(&Credentials::new("admin", "admin123")).await.unwrap();
    assert_eq!(token.access_token, "abc");

    let err = api.login(&Credentials::new("admin", "nope")).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredentials));

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0].target(), "/token");
    assert_eq!(
        requests[0].header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(requests[0].body, "username=admin&password=admin123");
}

#[tokio::test]
async fn missing_campaign_is_not_found() {
    let (url, recorded) = serve(vec![(404, r#"{"detail": "Campaign not found"}"#)]).await;
    let api = client(&url);

    let err = api
        .get_campaign_detail(Some("tok"), "verano 2025")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref name) if name == "verano 2025"));

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0].target(), "/campaigns/verano%202025");
}

#[tokio::test]
async fn duplicate_create_is_conflict() {
    let (url, recorded) =
        serve(vec![(400, r#"{"detail": "Campaign with this name already exists"}"#)]).await;
    let api = client(&url);

    let campaign = NewCampaign {
        campaign: Campaign::new(
            "verano",
            CampaignType::Monthly,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
        ),
        sites: Vec::new(),
        periods: Vec::new(),
    };
    let err = api.create_campaign(Some("tok"), &campaign).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(ref name) if name == "verano"));

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].target(), "/campaigns");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["name"], "verano");
    assert_eq!(body["tipo_campania"], "mensual");
    assert_eq!(body["fecha_inicio"], "2025-06-01");
}

#[tokio::test]
async fn inverted_search_range_never_leaves_the_client() {
    let (url, recorded) = serve(vec![(200, "[]")]).await;
    let api = client(&url);

    let err = api
        .search_campaigns_by_date(
            Some("tok"),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert!(recorded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn search_sends_both_dates() {
    let (url, recorded) = serve(vec![(200, "[]")]).await;
    let api = client(&url);

    let found = api
        .search_campaigns_by_date(
            None,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .await
        .unwrap();
    assert!(found.is_empty());

    let requests = recorded.lock().unwrap();
    assert_eq!(
        requests[0].target(),
        "/campaigns/search-by-date?start_date=2025-01-01&end_date=2025-03-31"
    );
}

#[tokio::test]
async fn health_round_trip() {
    let (url, recorded) = serve(vec![
        (200, r#"{"status": "ok"}"#),
        (503, r#"{"detail": "database unavailable"}"#),
    ])
    .await;
    let api = client(&url);

    assert_eq!(api.health().await.unwrap().status, "ok");
    assert!(matches!(
        api.health().await.unwrap_err(),
        ApiError::Status { status_code: 503, ref message } if message == "database unavailable"
    ));

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0].target(), "/health");
    assert_eq!(requests[0].header("authorization"), None);
}

async fn stall() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(10)).await;
    StatusCode::OK
}

#[tokio::test]
async fn slow_service_times_out() {
    let url = spawn(Router::new().fallback(stall)).await;
    let api = client_with_timeout(&url, 1);

    let err = api
        .list_campaigns(Some("tok"), &ListQuery::new(0, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout(ref endpoint) if endpoint.ends_with("/campaigns/")));
}
