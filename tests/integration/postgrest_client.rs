//! Integration tests for the PostgREST client and the deal flow service

use std::sync::Arc;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::logging::{init_test_logging, log_test_data, log_test_step};
use crate::common::test_data::{create_test_row, date};
use deal_flow::access::{AccessRole, AccessRoleResolver, AccessScope};
use deal_flow::api::{CenterDirectory, DealFlowSource, PostgrestClient};
use deal_flow::deal_flow::DealFlowService;
use deal_flow::models::{Config, DealFlowFilters, DealFlowUpdate};
use deal_flow::{BusinessCalendar, ChunkFetchError, DealFlowError};

const TABLE_PATH: &str = "/rest/v1/daily_deal_flow";

fn test_config(server: &MockServer, access_token: Option<&str>) -> Config {
    let uri = server.uri();
    let token = access_token.map(str::to_string);
    Config::from_lookup(move |key| match key {
        "SUPABASE_URL" => Some(uri.clone()),
        "SUPABASE_KEY" => Some("anon-key".to_string()),
        "SUPABASE_ACCESS_TOKEN" => token.clone(),
        "RATE_LIMIT_PER_MINUTE" => Some("6000".to_string()),
        _ => None,
    })
    .unwrap()
}

fn build_service(client: PostgrestClient) -> DealFlowService {
    let client = Arc::new(client);
    let access = Arc::new(AccessRoleResolver::new(client.clone()));
    DealFlowService::new(client, access, BusinessCalendar::default())
}

#[tokio::test]
async fn test_fetch_page_sends_range_and_parses_count() {
    init_test_logging();
    log_test_step("Fetching one page with filters");

    let server = MockServer::start().await;
    let rows = vec![create_test_row("a", date(2024, 1, 10), "Pending Approval")];

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("status", "eq.Pending Approval"))
        .and(query_param("date", "gte.2024-01-10"))
        .and(query_param("date", "lte.2024-01-10"))
        .and(header("apikey", "anon-key"))
        .and(header("Range", "0-99"))
        .and(header("Prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "0-0/1")
                .set_body_json(&rows),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PostgrestClient::new(&test_config(&server, None)).unwrap();
    let filters = DealFlowFilters {
        status: Some("Pending Approval".to_string()),
        limit: Some(100),
        ..DealFlowFilters::for_day(date(2024, 1, 10))
    };

    let page = client.fetch_page(&filters, &AccessScope::Unrestricted).await.unwrap();
    log_test_data("Page", &page);

    assert_eq!(page.count, 1);
    assert_eq!(page.records, rows);
}

#[tokio::test]
async fn test_working_dates_fetch_one_request_per_range() {
    init_test_logging();
    log_test_step("Fetching working dates through the service");

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("date", "gte.2024-01-10"))
        .and(query_param("date", "lte.2024-01-11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            create_test_row("a", date(2024, 1, 11), "DQ"),
            create_test_row("b", date(2024, 1, 10), "DQ"),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("date", "gte.2024-01-13"))
        .and(query_param("date", "lte.2024-01-13"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vec![create_test_row("c", date(2024, 1, 13), "Pending Approval")]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = build_service(PostgrestClient::new(&test_config(&server, None)).unwrap());
    let rows = service
        .fetch_all_by_working_dates(
            &[date(2024, 1, 13), date(2024, 1, 11), date(2024, 1, 10)],
            &DealFlowFilters::default(),
        )
        .await
        .unwrap();

    // Range order first, then the store's order inside each range
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_server_error_aborts_remaining_ranges() {
    init_test_logging();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("date", "gte.2024-01-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![create_test_row("a", date(2024, 1, 10), "DQ")]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("date", "gte.2024-01-12"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("date", "gte.2024-01-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .expect(0)
        .mount(&server)
        .await;

    let service = build_service(PostgrestClient::new(&test_config(&server, None)).unwrap());
    let result = service
        .fetch_all_by_working_dates(
            &[date(2024, 1, 10), date(2024, 1, 12), date(2024, 1, 14)],
            &DealFlowFilters::default(),
        )
        .await;

    let error = match result {
        Err(DealFlowError::Chunked(error)) => *error,
        other => panic!("expected a chunked fetch error, got {:?}", other),
    };
    assert_eq!(error.range().start, date(2024, 1, 12));
    assert_matches!(
        error.into_source(),
        Some(DealFlowError::Api { status: 503, ref message }) if message == "unavailable"
    );
}

#[tokio::test]
async fn test_center_user_is_scoped_to_lead_vendor() {
    init_test_logging();
    log_test_step("Resolving a center user and scoping the query");

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "user-7" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/centers"))
        .and(query_param("user_id", "eq.user-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "lead_vendor": "Maverick" }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("lead_vendor", "eq.Maverick"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .expect(1)
        .mount(&server)
        .await;

    let service = build_service(PostgrestClient::new(&test_config(&server, Some("user-token"))).unwrap());
    let filters = DealFlowFilters {
        lead_vendor: Some("all".to_string()),
        ..DealFlowFilters::default()
    };

    let page = service.fetch_all(&filters).await.unwrap();
    assert!(page.records.is_empty());
    assert_eq!(service.role().await, AccessRole::Center { lead_vendor: "Maverick".to_string() });
}

#[tokio::test]
async fn test_center_user_filtering_other_vendor_sees_nothing() {
    init_test_logging();
    log_test_step("Center user asks for another center's rows");

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "user-7" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/centers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "lead_vendor": "Maverick" }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("lead_vendor", "eq.Maverick"))
        .and(query_param("lead_vendor", "eq.Ark Tech"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .expect(1)
        .mount(&server)
        .await;

    let service = build_service(PostgrestClient::new(&test_config(&server, Some("user-token"))).unwrap());
    let filters = DealFlowFilters {
        lead_vendor: Some("Ark Tech".to_string()),
        ..DealFlowFilters::default()
    };

    let page = service.fetch_all(&filters).await.unwrap();
    assert!(page.records.is_empty());
    assert_eq!(page.count, 0);
}

#[tokio::test]
async fn test_missing_session_returns_no_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = PostgrestClient::new(&test_config(&server, Some("expired"))).unwrap();
    assert_eq!(client.current_user_id().await.unwrap(), None);

    let anonymous = PostgrestClient::new(&test_config(&server, None)).unwrap();
    assert_eq!(anonymous.current_user_id().await.unwrap(), None);
}

#[tokio::test]
async fn test_update_and_delete_target_row_id() {
    let server = MockServer::start().await;
    let updated = create_test_row("row-9", date(2024, 1, 10), "Pending Approval");

    Mock::given(method("PATCH"))
        .and(path(TABLE_PATH))
        .and(query_param("id", "eq.row-9"))
        .and(body_json(serde_json::json!({ "status": "Pending Approval" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&updated))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(TABLE_PATH))
        .and(query_param("id", "eq.row-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let service = build_service(PostgrestClient::new(&test_config(&server, None)).unwrap());
    let changes = DealFlowUpdate {
        status: Some("Pending Approval".to_string()),
        ..DealFlowUpdate::default()
    };

    assert_eq!(service.update("row-9", &changes).await.unwrap(), updated);
    service.remove("row-9").await.unwrap();
}

#[tokio::test]
async fn test_truncated_range_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "0-0/5")
                .set_body_json(vec![create_test_row("a", date(2024, 1, 10), "DQ")]),
        )
        .mount(&server)
        .await;

    let service = build_service(PostgrestClient::new(&test_config(&server, None)).unwrap());
    let filters = DealFlowFilters { limit: Some(1), ..DealFlowFilters::default() };
    let result = service.fetch_all_by_working_dates(&[date(2024, 1, 10)], &filters).await;

    assert_matches!(
        result,
        Err(DealFlowError::Chunked(error)) if matches!(*error, ChunkFetchError::Truncated { count: 5, limit: 1, .. })
    );
}

#[tokio::test]
async fn test_server_row_cap_is_an_error() {
    init_test_logging();
    log_test_step("Store returns fewer rows than its Content-Range total");

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(header("Range", "0-99"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "0-1/5")
                .set_body_json(vec![
                    create_test_row("a", date(2024, 1, 10), "DQ"),
                    create_test_row("b", date(2024, 1, 10), "DQ"),
                ]),
        )
        .mount(&server)
        .await;

    let service = build_service(PostgrestClient::new(&test_config(&server, None)).unwrap());
    let filters = DealFlowFilters { limit: Some(100), ..DealFlowFilters::default() };
    let result = service.fetch_all_by_working_dates(&[date(2024, 1, 10)], &filters).await;

    assert_matches!(
        result,
        Err(DealFlowError::Chunked(error))
            if matches!(*error, ChunkFetchError::Truncated { count: 5, returned: 2, limit: 100, .. })
    );
}
