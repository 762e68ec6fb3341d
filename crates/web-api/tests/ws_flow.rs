mod support;

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::oneshot, time::timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message as TungsteniteMessage};

use support::build_app;

async fn register(client: &Client, base: &str, email: &str, name: &str) -> (String, String) {
    let body: Value = client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({ "email": email, "name": name, "password": "segredo1" }))
        .send()
        .await
        .expect("register")
        .json()
        .await
        .expect("register json");
    (
        body["token"].as_str().expect("token").to_string(),
        body["id"].as_str().expect("id").to_string(),
    )
}

#[tokio::test]
async fn websocket_broadcast_flow() {
    let app = build_app().await;
    let router = app.router.clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    let base_http = format!("http://{addr}");
    let base_ws = format!("ws://{addr}");
    let client = Client::new();

    let (alice, _) = register(&client, &base_http, "alice@orbit.dev", "Alice").await;
    let (bob, bob_id) = register(&client, &base_http, "bob@orbit.dev", "Bob").await;
    let (carol, _) = register(&client, &base_http, "carol@orbit.dev", "Carol").await;

    let created: Value = client
        .post(format!("{base_http}/api/chat/conversations"))
        .bearer_auth(&alice)
        .json(&json!({ "type": "DIRECT", "otherUserId": bob_id }))
        .send()
        .await
        .expect("create conversation")
        .json()
        .await
        .expect("conversation json");
    let conversation_id = created["conversation"]["id"]
        .as_str()
        .expect("conversation id")
        .to_string();

    // 非参与者和缺少令牌的握手都会被拒绝
    assert!(
        connect_async(format!("{base_ws}/ws/chat/{conversation_id}?token={carol}"))
            .await
            .is_err()
    );
    assert!(connect_async(format!("{base_ws}/ws/chat/{conversation_id}"))
        .await
        .is_err());

    let (mut bob_socket, _) = connect_async(format!("{base_ws}/ws/chat/{conversation_id}?token={bob}"))
        .await
        .expect("bob connects");

    let status = client
        .post(format!(
            "{base_http}/api/chat/conversations/{conversation_id}/messages"
        ))
        .bearer_auth(&alice)
        .json(&json!({ "content": "olá, Bob" }))
        .send()
        .await
        .expect("send message")
        .status();
    assert!(status.is_success());

    let frame = timeout(Duration::from_secs(5), async {
        loop {
            match bob_socket.next().await {
                Some(Ok(TungsteniteMessage::Text(text))) => break text.as_str().to_owned(),
                Some(Ok(_)) => continue,
                other => panic!("socket closed before a message arrived: {other:?}"),
            }
        }
    })
    .await
    .expect("message within timeout");

    let pushed: Value = serde_json::from_str(&frame).expect("frame json");
    assert_eq!(pushed["content"], "olá, Bob");
    assert_eq!(pushed["conversationId"], conversation_id.as_str());
    assert_eq!(pushed["senderName"], "Alice");

    bob_socket.close(None).await.ok();
    let _ = shutdown_tx.send(());
}
