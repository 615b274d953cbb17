//! End-to-end tests for the typed client against a scripted server.

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

use vndb_client::{Client, ClientError, Filter, GetOptions, GetRequest};
use vndb_protocol::{Session, SessionConfig};

const EOT: u8 = 0x04;

async fn read_frame(reader: &mut (impl AsyncBufRead + Unpin)) -> Option<String> {
    let mut buf = Vec::new();
    if reader.read_until(EOT, &mut buf).await.unwrap() == 0 {
        return None;
    }
    assert_eq!(buf.pop(), Some(EOT));
    Some(String::from_utf8(buf).unwrap())
}

/// Canned responses for the commands the tests exercise.
fn respond_to(command: &str) -> String {
    if command == "dbstats" {
        let stats = json!({
            "users": 195_974, "threads": 12_641, "posts": 134_979,
            "vn": 27_284, "releases": 74_906, "tags": 2_743,
            "staff": 21_663, "producers": 10_736, "chars": 91_468,
            "traits": 2_913,
        });
        return format!("dbstats {stats}\x04");
    }
    if command.starts_with("get vn ") && command.contains("(id = 20471)") {
        let results = json!({
            "more": false,
            "num": 1,
            "items": [{
                "id": 20471,
                "title": "Summer Pockets",
                "original": "サマーポケッツ",
            }],
        });
        return format!("results {results}\x04");
    }
    if command.starts_with("set ulist ") {
        return "ok\x04".to_owned();
    }
    let error = json!({"id": "filter", "msg": "unknown filter field"});
    format!("error {error}\x04")
}

async fn fixture_server(stream: DuplexStream) {
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let login = read_frame(&mut reader).await.expect("login frame");
    assert!(login.starts_with("login "));
    writer.write_all(b"ok\x04").await.unwrap();
    while let Some(command) = read_frame(&mut reader).await {
        writer
            .write_all(respond_to(&command).as_bytes())
            .await
            .unwrap();
    }
}

async fn fixture_client() -> Client {
    let (client_end, server_end) = tokio::io::duplex(8192);
    drop(tokio::spawn(fixture_server(server_end)));
    let session = Session::handshake(client_end, &SessionConfig::default())
        .await
        .unwrap();
    Client::new(session)
}

#[tokio::test]
async fn dbstats_returns_typed_counters() {
    let client = fixture_client().await;
    let stats = client.dbstats().await.unwrap();
    assert_eq!(stats.users, 195_974);
    assert_eq!(stats.vn, 27_284);
    assert_eq!(stats.traits, 2_913);
}

#[tokio::test]
async fn fetch_vn_by_id_returns_the_fixture_title() {
    let client = fixture_client().await;
    let page = client
        .get_vn(&["basic", "details"], Filter::eq("id", 20471))
        .await
        .unwrap();
    assert!(!page.more);
    assert_eq!(page.num, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0]["title"], "Summer Pockets");
}

#[tokio::test]
async fn fetch_with_options_still_resolves() {
    let client = fixture_client().await;
    let request = GetRequest::new(
        vndb_client::EntityType::Vn,
        &["basic"],
        Filter::eq("id", 20471),
    )
    .with_options(GetOptions {
        results: Some(1),
        ..GetOptions::default()
    });
    let page = client.get(&request).await.unwrap();
    assert_eq!(page.items[0]["id"], 20471);
}

#[tokio::test]
async fn server_error_response_becomes_a_typed_error() {
    let client = fixture_client().await;
    let err = client
        .get_release(&["basic"], Filter::eq("nonexistent", 1))
        .await
        .unwrap_err();
    match err {
        ClientError::Server { id, msg } => {
            assert_eq!(id, "filter");
            assert_eq!(msg, "unknown filter field");
        }
        other => panic!("unexpected: {other}"),
    }
}

#[tokio::test]
async fn set_ulist_resolves_on_ok() {
    let client = fixture_client().await;
    client
        .set_ulist(20471, json!({"vote": 90}))
        .await
        .unwrap();
}

#[tokio::test]
async fn commands_share_one_session() {
    let client = fixture_client().await;
    let stats = client.dbstats().await.unwrap();
    let page = client
        .get_vn(&["basic"], Filter::eq("id", 20471))
        .await
        .unwrap();
    assert_eq!(stats.vn, 27_284);
    assert_eq!(page.items[0]["title"], "Summer Pockets");
    client.close().await;
    let err = client.dbstats().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Session(vndb_protocol::SessionError::Closed)
    ));
}
