//! Fake collaborator endpoints for HTTP-level tests.

use axum::Router;
use tracing::Level;

use crate::backend::config::Config;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server failed");
    });
    format!("http://{addr}")
}

/// Backend under `{base}/api`, AI service under `{base}/ai`.
pub fn fake_config(base: &str) -> Config {
    Config {
        api_base_url: format!("{base}/api"),
        ai_base_url: format!("{base}/ai"),
        log_level: Level::DEBUG,
        store_path: String::new(),
    }
}
