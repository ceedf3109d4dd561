use axum::{http::StatusCode, routing::post, Json, Router};
use std::net::SocketAddr;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("axum serve");
    });
    addr
}

async fn run_remote(args: Vec<String>, base_url: Option<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || {
        let bin = assert_cmd::cargo::cargo_bin!("gistpipe");
        let mut cmd = std::process::Command::new(bin);
        cmd.arg("remote").args(args).env_remove("GISTPIPE_ENV_FILE");
        match base_url {
            Some(u) => cmd.env("GISTPIPE_API_BASE_URL", u),
            None => cmd.env_remove("GISTPIPE_API_BASE_URL"),
        };
        cmd.output().expect("run gistpipe remote")
    })
    .await
    .expect("join")
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_success_returns_api_summary() {
    let app = Router::new().route(
        "/api/summarize",
        post(|Json(body): Json<serde_json::Value>| async move {
            let lang = body["lang"].as_str().unwrap_or("").to_string();
            let text = body["text"].as_str().unwrap_or("").to_string();
            Json(serde_json::json!({ "summary": format!("{lang}|{text}") }))
        }),
    );
    let addr = serve(app).await;

    let out = run_remote(
        vec!["  padded text  ".to_string(), "--language".to_string(), "es".to_string()],
        Some(format!("http://{addr}")),
    )
    .await;
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["kind"].as_str(), Some("summarize_remote"));
    assert_eq!(v["ok"].as_bool(), Some(true));
    assert_eq!(v["origin"].as_str(), Some("remote"));
    assert_eq!(v["summary"].as_str(), Some("es|padded text"));
    assert!(v["notice"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_falls_back_to_demo_summary() {
    let app = Router::new().route(
        "/api/summarize",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
    );
    let addr = serve(app).await;

    let words: Vec<String> = (1..=40).map(|i| format!("w{i}")).collect();
    let out = run_remote(vec![words.join(" ")], Some(format!("http://{addr}"))).await;
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["origin"].as_str(), Some("demo"));
    // floor(40 * 0.3) = 12 words.
    assert_eq!(
        v["summary"].as_str(),
        Some(format!("[DEMO] {}...", words[..12].join(" ")).as_str())
    );
    assert_eq!(
        v["notice"].as_str(),
        Some("API is not available in demo mode. Here's a simulated summary:")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unconfigured_api_uses_demo_and_text_output_shows_notice() {
    let out = run_remote(
        vec!["one two three".to_string(), "--output".to_string(), "text".to_string()],
        None,
    )
    .await;
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "[DEMO] one two three...");
    assert!(String::from_utf8_lossy(&out.stderr).contains("demo mode"));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_text_is_rejected() {
    let out = run_remote(vec!["   ".to_string()], None).await;
    assert!(!out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["error"]["code"].as_str(), Some("invalid_params"));
    assert_eq!(
        v["error"]["message"].as_str(),
        Some("Please enter some text to summarize.")
    );
}
