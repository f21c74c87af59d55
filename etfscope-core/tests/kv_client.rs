//! Key-value client against a local mock of the table service.

use etfscope_core::store::{AttributeValue, KvClient, KvRecord, StoreConfig};
use etfscope_core::DataError;
use mockito::Matcher;
use serde_json::json;

fn client_for(server: &mockito::Server) -> KvClient {
    KvClient::new(StoreConfig {
        url: format!("{}/items", server.url()),
        api_key: "test-key".into(),
        table_name: "etf_universe".into(),
    })
    .unwrap()
}

fn sample_record() -> KvRecord {
    let mut rec = KvRecord::new();
    rec.insert("itemcode".into(), AttributeValue::string("069500"));
    rec.insert("itemname".into(), AttributeValue::string("KODEX 200"));
    rec.insert("marketSum".into(), AttributeValue::number(61234.0));
    rec
}

#[test]
fn put_item_sends_table_item_and_api_key() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/items")
        .match_header("x-api-key", "test-key")
        .match_body(Matcher::Json(json!({
            "TableName": "etf_universe",
            "Item": {
                "itemcode": {"S": "069500"},
                "itemname": {"S": "KODEX 200"},
                "marketSum": {"N": "61234"}
            }
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();

    client_for(&server).put_item(&sample_record()).unwrap();
    mock.assert();
}

#[test]
fn bad_request_becomes_remote_error_without_retry() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/items")
        .with_status(400)
        .with_header("x-amzn-ErrorType", "ValidationException")
        .with_body(r#"{"message": "One or more parameter values were invalid"}"#)
        .expect(1)
        .create();

    let err = client_for(&server).put_item(&sample_record()).unwrap_err();
    match err {
        DataError::Remote {
            status_code,
            error_type,
            message,
        } => {
            assert_eq!(status_code, 400);
            assert_eq!(error_type.as_deref(), Some("ValidationException"));
            assert_eq!(
                message.as_deref(),
                Some("One or more parameter values were invalid")
            );
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    mock.assert();
}

#[test]
fn non_200_success_status_is_still_an_error() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("POST", "/items").with_status(201).create();

    let err = client_for(&server).put_item(&sample_record()).unwrap_err();
    assert!(matches!(err, DataError::Remote { status_code: 201, .. }));
}

#[test]
fn remote_error_without_json_body_has_no_message() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/items")
        .with_status(500)
        .with_body("Internal Server Error")
        .create();

    match client_for(&server).put_item(&sample_record()).unwrap_err() {
        DataError::Remote {
            status_code,
            error_type,
            message,
        } => {
            assert_eq!(status_code, 500);
            assert_eq!(error_type, None);
            assert_eq!(message, None);
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[test]
fn query_posts_to_query_path_and_decodes_items() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/items/query")
        .match_header("x-api-key", "test-key")
        .match_body(Matcher::Json(json!({
            "TableName": "etf_universe",
            "KeyConditionExpression": "itemcode = :code",
            "ExpressionAttributeValues": {":code": {"S": "069500"}}
        })))
        .with_status(200)
        .with_body(
            json!({
                "Count": 1,
                "Items": [{"itemcode": {"S": "069500"}, "groupMarketSum": {"N": "91444"}}]
            })
            .to_string(),
        )
        .create();

    let mut values = KvRecord::new();
    values.insert(":code".into(), AttributeValue::string("069500"));

    let out = client_for(&server)
        .query("itemcode = :code", &values)
        .unwrap();
    mock.assert();

    assert_eq!(out.count, Some(1));
    assert_eq!(out.items.len(), 1);
    assert_eq!(out.items[0]["groupMarketSum"].as_f64(), Some(91444.0));
}

#[test]
fn query_with_unexpected_body_is_parse_error() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/items/query")
        .with_status(200)
        .with_body("<html></html>")
        .create();

    let err = client_for(&server)
        .query("itemcode = :code", &KvRecord::new())
        .unwrap_err();
    assert!(matches!(err, DataError::Parse(_)));
}

#[test]
fn unreachable_service_is_transport_error() {
    // Port 9 (discard) on localhost is not listening in test environments.
    let client = KvClient::new(StoreConfig {
        url: "http://127.0.0.1:9/items".into(),
        api_key: "k".into(),
        table_name: "t".into(),
    })
    .unwrap();
    assert!(matches!(
        client.put_item(&sample_record()),
        Err(DataError::Transport(_))
    ));
}
