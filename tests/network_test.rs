use pagespeed_audit::error::AuditError;
use pagespeed_audit::network::{AuditFetcher, PageSpeedClient, build_client};
use pagespeed_audit::options::Strategy;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/pagespeedonline/v5/runPagespeed";

fn client_for(server: &MockServer) -> PageSpeedClient {
    let endpoint = Url::parse(&format!("{}{}", server.uri(), API_PATH)).unwrap();
    PageSpeedClient::new(build_client("test-agent").unwrap(), endpoint)
}

#[tokio::test]
async fn test_fetch_sends_expected_query_and_decodes_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("url", "https://www.example.com/"))
        .and(query_param("key", "secret-key"))
        .and(query_param("strategy", "mobile"))
        .and(query_param("category", "performance"))
        .and(query_param("category", "accessibility"))
        .and(query_param("category", "best-practices"))
        .and(query_param("category", "seo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("fixtures/pagespeed_mobile.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = client_for(&mock_server)
        .fetch("https://www.example.com/", "secret-key", Strategy::Mobile)
        .await
        .expect("Fetch should succeed");

    assert_eq!(response.lighthouse_result.device(), Some("mobile"));
    assert!(response.loading_experience.is_some());
}

#[tokio::test]
async fn test_fetch_non_200_status_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("Quota exceeded"))
        .expect(1) // no retries
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .fetch("https://www.example.com/", "key", Strategy::Desktop)
        .await
        .unwrap_err();

    assert!(matches!(err, AuditError::Status(429)), "Got {:?}", err);
}

#[tokio::test]
async fn test_fetch_other_success_status_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .fetch("https://www.example.com/", "key", Strategy::Desktop)
        .await
        .unwrap_err();

    assert!(matches!(err, AuditError::Status(204)), "Got {:?}", err);
}

#[tokio::test]
async fn test_fetch_invalid_json_is_a_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .fetch("https://www.example.com/", "key", Strategy::Mobile)
        .await
        .unwrap_err();

    assert!(matches!(err, AuditError::Decode(_)), "Got {:?}", err);
}

#[tokio::test]
async fn test_fetch_unreachable_endpoint_is_a_network_error() {
    // Grab a free port and release it again, so nothing is listening there.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let endpoint = Url::parse(&format!("http://127.0.0.1:{}{}", port, API_PATH)).unwrap();
    let client = PageSpeedClient::new(build_client("test-agent").unwrap(), endpoint);

    let err = client
        .fetch("https://www.example.com/", "key", Strategy::Mobile)
        .await
        .unwrap_err();

    assert!(matches!(err, AuditError::Network(_)), "Got {:?}", err);
}
