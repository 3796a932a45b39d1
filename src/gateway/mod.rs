//! HTTP file gateway: upload, download and copy files into service storage.

mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::errors::AppResult;
use crate::storage::PathRouter;

pub use handlers::{CopyRequest, CopyResponse, UploadResponse};

#[derive(Clone)]
pub struct GatewayState {
    pub paths: Arc<PathRouter>,
    /// Uploads land here until their destination is known
    pub staging_dir: PathBuf,
}

impl GatewayState {
    pub fn new(paths: PathRouter) -> Self {
        Self {
            paths: Arc::new(paths),
            staging_dir: std::env::temp_dir().join("voice-onboard-uploads"),
        }
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }
}

/// Build the gateway routes over the given path router
pub fn router(paths: PathRouter) -> Router {
    routes(GatewayState::new(paths))
}

pub fn routes(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/upload",
            // model videos routinely exceed the default 2 MB limit
            post(handlers::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/download", get(handlers::download))
        .route("/copy", post(handlers::copy))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve the gateway until `shutdown` resolves
pub async fn serve<F>(addr: SocketAddr, paths: PathRouter, shutdown: F) -> AppResult<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    log::info!("File gateway listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(paths))
        .with_graceful_shutdown(shutdown)
        .await?;

    log::info!("File gateway stopped");
    Ok(())
}
