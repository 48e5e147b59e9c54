//! Web server module.

mod handlers;

pub use handlers::*;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::scheduler::SharedSnapshots;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub snapshots: SharedSnapshots,
}

/// Serves the latest snapshots and the static output directory.
pub struct Server {
    port: u16,
    static_dir: PathBuf,
    state: AppState,
}

impl Server {
    pub fn new(port: u16, static_dir: PathBuf, snapshots: SharedSnapshots) -> Self {
        Self {
            port,
            static_dir,
            state: AppState { snapshots },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        Router::new()
            .route("/api/status", get(handlers::handle_status))
            .route("/api/history", get(handlers::handle_history))
            .fallback_service(ServeDir::new(&self.static_dir))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::CheckResult;
    use crate::scheduler::{GroupResult, Snapshots};
    use crate::snapshot::StatusSnapshot;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    async fn spawn(server: Server) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = server.routes();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_status_before_and_after_first_cycle() {
        let dir = TempDir::new().unwrap();
        let snapshots = Arc::new(RwLock::new(Snapshots::default()));
        let base = spawn(Server::new(0, dir.path().to_path_buf(), snapshots.clone())).await;

        let resp = reqwest::get(format!("{}/api/status", base)).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        snapshots.write().await.status = Some(StatusSnapshot {
            groups: vec![GroupResult {
                title: "Web".to_string(),
                results: vec![CheckResult {
                    name: "site".to_string(),
                    status: false,
                }],
            }],
            incidents: String::new(),
            last_updated: "2024-01-01 00:00:00".to_string(),
        });

        let body: serde_json::Value = reqwest::get(format!("{}/api/status", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["groups"][0]["results"][0]["status"], false);

        let resp = reqwest::get(format!("{}/api/history", base)).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_static_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>status</h1>").unwrap();
        let snapshots = Arc::new(RwLock::new(Snapshots::default()));
        let base = spawn(Server::new(0, dir.path().to_path_buf(), snapshots)).await;

        let body = reqwest::get(format!("{}/index.html", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "<h1>status</h1>");
    }
}
