//! Integration test: start the relay on a free port, GET / and /ping, assert
//! the static liveness strings. Does not require a live bridge sidecar — the
//! connector just retries its poll in the background.

use lib::config::Config;
use lib::server;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

fn temp_config_dir() -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(format!("relic-server-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(dir.join("session")).expect("create session dir");
    let config_path = dir.join("config.json");
    std::fs::File::create(&config_path)
        .and_then(|mut f| f.write_all(b"{}"))
        .expect("write config.json");
    (dir, config_path)
}

fn test_config(port: u16, bridge_port: u16) -> Config {
    let mut config = Config::default();
    config.server.port = port;
    config.server.bind = "127.0.0.1".to_string();
    config.forwarder.destination = Some("15559998888@c.us".to_string());
    // Point the bridge at a closed local port so the connector errors quietly.
    config.bridge.base_url = format!("http://127.0.0.1:{}", bridge_port);
    config
}

#[tokio::test]
async fn liveness_endpoints_respond() {
    let port = free_port();
    let (_temp_dir, config_path) = temp_config_dir();
    let config = test_config(port, free_port());

    let server_handle = tokio::spawn(async move {
        let _ = server::run(config, config_path).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.get(&base).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body = resp.text().await.expect("read body");
                assert_eq!(body, "relic relay is running");

                let ping = client
                    .get(format!("{}/ping", base))
                    .send()
                    .await
                    .expect("GET /ping");
                assert!(ping.status().is_success());
                assert_eq!(ping.text().await.expect("read ping body"), "pong");
                return;
            }
            Ok(_) => {}
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let _ = server_handle.abort();
    panic!(
        "GET {} did not return the liveness string within 5s; last error: {:?}",
        base, last_err
    );
}

#[tokio::test]
async fn run_fails_fast_without_destination() {
    let (_temp_dir, config_path) = temp_config_dir();
    let mut config = test_config(free_port(), free_port());
    config.forwarder.destination = None;

    let err = server::run(config, config_path)
        .await
        .expect_err("startup must fail without a destination");
    assert!(err.to_string().contains("destination"));
}

#[tokio::test]
async fn run_fails_fast_without_initialized_config() {
    let dir = std::env::temp_dir().join(format!("relic-noinit-test-{}", uuid::Uuid::new_v4()));
    let config = test_config(free_port(), free_port());

    let err = server::run(config, dir.join("config.json"))
        .await
        .expect_err("startup must fail before init");
    assert!(err.to_string().contains("relic init"));
}
