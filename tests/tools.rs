//! Tool surface tests against a mocked OpenCTI endpoint.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};

use opencti_mcp::{OpenCtiClient, OpenCtiConfig, OpenCtiError, OpenCtiTools};

fn tools_for(server: &ServerGuard) -> OpenCtiTools {
    let config = OpenCtiConfig::new(Some(server.url()), Some("test-token".into())).unwrap();
    OpenCtiTools::new(OpenCtiClient::new(config).unwrap())
}

#[tokio::test]
async fn test_search_threats_renders_nodes() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/graphql")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJson(json!({
            "variables": {"keyword": "Emotet", "first": 5}
        })))
        .with_status(200)
        .with_body(
            json!({
                "data": {"globalSearch": {"edges": [
                    {"node": {"id": "malware--1", "name": "Emotet"}},
                    {"node": {"id": "report--2", "name": "Emotet returns"}}
                ]}}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let text = tools_for(&server).search_threats("Emotet", None).await;
    let rendered: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(
        rendered,
        json!([
            {"id": "malware--1", "name": "Emotet"},
            {"id": "report--2", "name": "Emotet returns"}
        ])
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_threats_no_results() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"data": {"globalSearch": {"edges": []}}}"#)
        .create_async()
        .await;

    let text = tools_for(&server).search_threats("nothing-here", Some(3)).await;
    assert_eq!(text, "No results found for 'nothing-here'.");
}

#[tokio::test]
async fn test_indicators_error_is_text() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"errors": [{"message": "Unknown filter key"}, {"message": "Bad input"}]}"#)
        .create_async()
        .await;

    let text = tools_for(&server)
        .list_latest_indicators(Some(10), Some("stix"))
        .await;
    assert_eq!(
        text,
        "Error retrieving indicators: OpenCTI GraphQL errors: Unknown filter key; Bad input"
    );
}

#[tokio::test]
async fn test_entity_not_found_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"data": {"stixDomainObject": null}}"#)
        .create_async()
        .await;

    let text = tools_for(&server).get_entity_by_id("malware--missing").await;
    assert_eq!(text, "No entity found with ID 'malware--missing'.");
}

#[tokio::test]
async fn test_reports_transport_error_is_text() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(503)
        .create_async()
        .await;

    let text = tools_for(&server).get_intelligence_reports(None).await;
    assert!(text.starts_with("Error retrieving reports: HTTP connection error with OpenCTI"));
}

#[tokio::test]
async fn test_threat_actor_lookup() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .match_body(Matcher::PartialJson(json!({
            "variables": {"first": 10, "filters": {"mode": "and", "filterGroups": []}}
        })))
        .with_status(200)
        .with_body(r#"{"data": {"threatActors": {"edges": [{"node": {"name": "APT29"}}]}}}"#)
        .create_async()
        .await;

    let text = tools_for(&server).search_threat_actors("APT29", None).await;
    assert!(text.contains("\"APT29\""));
}

#[tokio::test]
async fn test_unconfigured_tools_never_call_out() {
    let err = OpenCtiConfig::new(None, None).unwrap_err();
    assert!(matches!(err, OpenCtiError::Configuration(_)));

    let tools = OpenCtiTools::unconfigured(&err);
    let text = tools.search_malware("Emotet", None).await;
    assert!(text.starts_with("Error: OpenCTI client is not configured correctly"));
}
